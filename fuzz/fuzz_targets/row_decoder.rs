//! Fuzz target for the streaming row decoder.
//!
//! Tests:
//! - Arbitrary byte streams never panic the decoder
//! - Decoded values never exceed the configured maximum
//! - A completed row holds exactly `width` values

#![no_main]

use arbitrary::Arbitrary;
use kuwahara_stream::codec::RowDecoder;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct DecodeInput {
    width: u8,
    max_value: u16,
    bytes: Vec<u8>,
}

fuzz_target!(|input: DecodeInput| {
    let width = usize::from(input.width).max(1);
    let max_value = input.max_value.max(1);
    let mut decoder = RowDecoder::new(width, max_value);

    for &byte in input.bytes.iter().take(64 * 1024) {
        if decoder.push(byte) {
            assert_eq!(decoder.values().len(), width);
            decoder.reset();
        }
        assert!(decoder.values().len() < width);
        assert!(decoder.values().iter().all(|&v| v <= max_value));
    }
});
