//! Fuzz target for the handshake token matcher.
//!
//! The matcher must fire somewhere in a stream that contains the go token,
//! whatever noise precedes it.

#![no_main]

use kuwahara_stream::protocol::{TokenMatcher, GO_TOKEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|noise: Vec<u8>| {
    let mut matcher = TokenMatcher::new(GO_TOKEN);
    let mut fired = false;
    for &byte in noise.iter().chain(GO_TOKEN) {
        fired |= matcher.feed(byte);
        assert!(matcher.progress() < GO_TOKEN.len());
    }
    assert!(fired);
});
