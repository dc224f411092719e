//! Fuzz target for the tag-markup translator.
//!
//! Run with: cargo +nightly fuzz run fuzz_markup

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = hostlink_core::markup::translate(s);
    }
});
