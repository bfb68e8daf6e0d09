//! Property tests for destination key construction.

use std::path::{Path, PathBuf};

use proptest::prelude::*;

use longshore::plan::{destination_key, KeyLayout};

fn relative_path() -> impl Strategy<Value = PathBuf> {
    // Segments never start with a dot, so "." and ".." cannot appear.
    let segment = proptest::string::string_regex("[A-Za-z0-9_-][A-Za-z0-9._-]{0,11}").unwrap();
    proptest::collection::vec(segment, 1..=4)
        .prop_map(|segments| segments.iter().collect::<PathBuf>())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Source-relative keys are "<prefix>/<path>" with single
    /// forward slashes, whatever the platform separator is.
    #[test]
    fn property_source_relative_keys_are_prefixed(
        prefix in "[A-Za-z0-9._-]{1,16}",
        relative in relative_path(),
    ) {
        let key = destination_key(
            KeyLayout::SourceRelative,
            &prefix,
            Path::new("build"),
            &relative,
        );

        prop_assert!(key.starts_with(&format!("{}/", prefix)), "got {:?}", key);
        prop_assert!(!key.contains("//"), "got {:?}", key);
        prop_assert!(!key.contains('\\'), "got {:?}", key);
    }

    /// PROPERTY: The source-directory layout inserts exactly the directory
    /// name between the prefix and the relative path.
    #[test]
    fn property_include_source_dir_inserts_dir_name(
        prefix in "[A-Za-z0-9._-]{1,16}",
        dir in "[A-Za-z0-9_-][A-Za-z0-9._-]{0,11}",
        relative in relative_path(),
    ) {
        let root = PathBuf::from(&dir);
        let key = destination_key(KeyLayout::IncludeSourceDir, &prefix, &root, &relative);

        prop_assert!(
            key.starts_with(&format!("{}/{}/", prefix, dir)),
            "got {:?}",
            key
        );
    }
}
