//! Fuzz target for the TOML configuration parser and catalogue document.
//!
//! Run with: cargo +nightly fuzz run fuzz_config_parser

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = hostlink_config::AppConfig::parse(s);
        let _ = hostlink_config::CatalogueDocument::parse(s);
    }
});
