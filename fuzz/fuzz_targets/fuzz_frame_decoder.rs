//! Fuzz target: `CobsDecoder::append`
//!
//! Drives arbitrary byte sequences into the streaming frame decoder and
//! asserts that it never panics, never yields an oversize payload, and
//! still decodes a clean frame after a delimiter.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use flightlink::transport::cobs::{
    CobsDecoder, DELIMITER, DecodeStatus, MAX_PAYLOAD_LEN, encode_frame,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = CobsDecoder::new();

    for &b in data {
        if decoder.append(b) == DecodeStatus::Complete {
            assert!(decoder.payload().len() <= MAX_PAYLOAD_LEN, "payload exceeds buffer");
        }
    }

    // Resync: delimiter, then a known-good frame.
    decoder.append(DELIMITER);
    let frame = encode_frame(b"sync").expect("small payload encodes");
    let mut got = false;
    for &b in frame.iter() {
        if decoder.append(b) == DecodeStatus::Complete {
            assert_eq!(decoder.payload(), b"sync");
            got = true;
        }
    }
    assert!(got, "decoder failed to resync");
});
