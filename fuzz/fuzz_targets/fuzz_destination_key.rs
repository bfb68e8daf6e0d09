#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;

use longshore::plan::{destination_key, KeyLayout};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Key construction should never panic, whatever the path looks like
        let relative = Path::new(text);
        let _ = destination_key(KeyLayout::SourceRelative, "1.0.0", Path::new("build"), relative);
        let _ = destination_key(KeyLayout::IncludeSourceDir, "qa", Path::new(text), relative);
    }
});
