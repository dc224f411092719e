//! Fuzz target for reply reassembly and normalisation.
//!
//! Run with: cargo +nightly fuzz run fuzz_reassembler
//!
//! The first byte picks the framing, strategy, and split point; the rest is
//! fed to the reassembler in two chunks and any completed reply normalised.

#![no_main]

use hostlink_core::wire::{Framing, Reassembler, ReassemblyStrategy, normalize};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, body)) = data.split_first() else {
        return;
    };
    let framing = match selector % 3 {
        0 => Framing::NulByte,
        1 => Framing::TextSentinel,
        _ => Framing::HalfClose,
    };
    let strategy = if selector & 0x80 == 0 {
        ReassemblyStrategy::Delimiter
    } else {
        ReassemblyStrategy::Speculative
    };
    let split = (selector as usize >> 2).min(body.len());

    let mut reassembler = Reassembler::new(framing, strategy);
    let mut reply = None;
    for chunk in [&body[..split], &body[split..]] {
        if let Ok(Some(value)) = reassembler.push(chunk) {
            reply = Some(value);
            break;
        }
    }
    let reply = reply.or_else(|| reassembler.finish().ok());
    if let Some(value) = reply {
        let _ = normalize(value);
    }
    let _ = reassembler.salvage();
});
