//! Property tests for content type resolution.

use std::collections::BTreeMap;

use proptest::prelude::*;

use longshore::content_type::{from_suffix, sniff_bytes};

fn override_table() -> BTreeMap<String, String> {
    [
        ("css", "text/css"),
        ("js", "application/javascript"),
        ("js.map", "application/javascript"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Suffix matching never panics, and only claims a match when
    /// the file name really ends with ".<suffix>".
    #[test]
    fn property_suffix_match_is_sound(name in "[A-Za-z0-9._-]{0,32}") {
        let table = override_table();
        if let Some(resolved) = from_suffix(&name, &table) {
            let justified = table.iter().any(|(suffix, content_type)| {
                *content_type == resolved && name.ends_with(&format!(".{}", suffix))
            });
            prop_assert!(justified, "resolved {:?} for {:?}", resolved, name);
        }
    }

    /// PROPERTY: Byte sniffing is total: any head yields a usable type.
    #[test]
    fn property_sniff_always_yields_a_type(
        head in proptest::collection::vec(any::<u8>(), 0..512)
    ) {
        let content_type = sniff_bytes(&head);
        prop_assert!(content_type.contains('/'), "got {:?}", content_type);
    }
}
