//! Fuzz target for the decode/encode identity
//!
//! Any byte sequence that decodes as a frame must re-encode to exactly the
//! same bytes: the payload runs to the end of the frame, so no information
//! can be lost or invented.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wavelink_proto::{Addressing, Frame, MacAddr};

fuzz_target!(|data: &[u8]| {
    if let Ok((Some(dest), frame)) = Frame::decode(Addressing::Prefixed, data) {
        let encoded = frame.encode(Addressing::Prefixed, dest, data.len()).unwrap();
        assert_eq!(&encoded[..], data);
    }

    if let Ok((None, frame)) = Frame::decode(Addressing::Direct, data) {
        let encoded = frame
            .encode(Addressing::Direct, MacAddr::BROADCAST, data.len())
            .unwrap();
        assert_eq!(&encoded[..], data);
    }
});
