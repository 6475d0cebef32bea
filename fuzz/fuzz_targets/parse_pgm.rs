//! Fuzz target for the plain graymap parser.
//!
//! Any image the parser accepts must encode and parse back to itself.

#![no_main]

use kuwahara_stream::codec::{encode_pgm, parse_pgm};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    if let Ok(image) = parse_pgm(text) {
        assert!(image.as_slice().iter().all(|&v| v <= image.max_value()));
        let reparsed = parse_pgm(&encode_pgm(&image)).expect("encoded image must parse");
        assert_eq!(reparsed, image);
    }
});
