#![no_main]

use std::collections::BTreeMap;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Byte sniffing must be total over arbitrary heads
    let _ = longshore::content_type::sniff_bytes(data);

    if let Ok(name) = std::str::from_utf8(data) {
        let mut overrides = BTreeMap::new();
        overrides.insert("js".to_string(), "application/javascript".to_string());
        overrides.insert("js.map".to_string(), "application/javascript".to_string());
        let _ = longshore::content_type::from_suffix(name, &overrides);
    }
});
