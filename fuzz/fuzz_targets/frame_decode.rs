//! Fuzz target for Frame::decode
//!
//! This fuzzer tests frame decoding with arbitrary byte sequences to find:
//! - Parser crashes or panics
//! - Out-of-bounds slicing in header extraction
//! - Malformed type bytes that bypass validation
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wavelink_proto::{Addressing, Frame};

fuzz_target!(|data: &[u8]| {
    // Attempt to decode arbitrary bytes under both addressing modes
    // This should never panic, only return Err for invalid data
    let _ = Frame::decode(Addressing::Direct, data);
    let _ = Frame::decode(Addressing::Prefixed, data);
});
