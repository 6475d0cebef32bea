//! Phase handshake tokens and the byte-stream scanner that finds them.
//!
//! After phase 1 the device sends [`READY_TOKEN`] and waits for the peer's
//! [`GO_TOKEN`]. The go token needs no terminator; it matches as soon as its
//! last byte arrives.

use crate::error::AppResult;
use crate::transport::Transport;
use std::time::{Duration, Instant};

/// Sent by the device once phase 1 output is complete.
pub const READY_TOKEN: &[u8] = b"#READY2#\n";

/// The ready token without its line terminator, as scanned for by the peer.
pub const READY_MARKER: &[u8] = b"#READY2#";

/// Sent by the peer when it is about to stream phase 2 rows.
pub const GO_TOKEN: &[u8] = b"#GO2#";

/// Incremental matcher for a fixed token in an arbitrary byte stream.
///
/// On a mismatch, matching restarts at position 1 if the byte equals the
/// token's first byte and at position 0 otherwise.
#[derive(Debug, Clone)]
pub struct TokenMatcher<'a> {
    token: &'a [u8],
    matched: usize,
}

impl<'a> TokenMatcher<'a> {
    /// Matcher for `token`, which must not be empty
    pub fn new(token: &'a [u8]) -> Self {
        Self { token, matched: 0 }
    }

    /// Feed one byte; returns `true` when the token has just been completed.
    pub fn feed(&mut self, byte: u8) -> bool {
        if self.token.get(self.matched) == Some(&byte) {
            self.matched += 1;
        } else if self.token.first() == Some(&byte) {
            self.matched = 1;
        } else {
            self.matched = 0;
        }

        if self.matched == self.token.len() {
            self.matched = 0;
            return true;
        }
        false
    }

    /// Token bytes matched so far
    pub fn progress(&self) -> usize {
        self.matched
    }
}

/// Scan incoming bytes for `token` for at most `total`.
///
/// Returns `Ok(false)` when the bound expires first. Bytes that are not part
/// of the token are discarded.
pub fn wait_for_token<T: Transport + ?Sized>(
    transport: &mut T,
    token: &[u8],
    total: Duration,
) -> AppResult<bool> {
    let deadline = Instant::now() + total;
    let mut matcher = TokenMatcher::new(token);

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(false);
        }

        match transport.receive_byte(remaining)? {
            Some(byte) if matcher.feed(byte) => return Ok(true),
            Some(_) => {}
            None => return Ok(false),
        }
    }
}
