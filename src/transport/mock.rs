//! Scripted transport for exercising the controller without a peer.
//!
//! Inbound data is a queue of bytes and silences. A silence makes exactly one
//! `receive_byte` call time out; an exhausted script times out forever.
//! Everything sent is recorded for later inspection.

use super::Transport;
use crate::error::{AppResult, KuwaharaError};
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inbound {
    Byte(u8),
    Silence,
}

/// In-memory transport with a scripted peer.
///
/// # Example
///
/// ```
/// use kuwahara_stream::transport::{MockTransport, Transport};
/// use std::time::Duration;
///
/// let mut link = MockTransport::with_input(b"7 ");
/// assert_eq!(link.receive_byte(Duration::from_millis(1))?, Some(b'7'));
/// link.send(b"ok")?;
/// assert_eq!(link.sent_text(), "ok");
/// # Ok::<(), kuwahara_stream::error::KuwaharaError>(())
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    inbound: VecDeque<Inbound>,
    sent: Vec<u8>,
    fail_sends: bool,
}

impl MockTransport {
    /// Create a transport with nothing to read
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that will deliver `bytes`
    pub fn with_input(bytes: &[u8]) -> Self {
        let mut transport = Self::new();
        transport.push_bytes(bytes);
        transport
    }

    /// Queue more inbound bytes
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied().map(Inbound::Byte));
    }

    /// Queue inbound text
    pub fn push_str(&mut self, text: &str) {
        self.push_bytes(text.as_bytes());
    }

    /// Queue one receive timeout
    pub fn push_silence(&mut self) {
        self.inbound.push_back(Inbound::Silence);
    }

    /// Make every subsequent send fail as if the link dropped
    pub fn fail_sends(&mut self) {
        self.fail_sends = true;
    }

    /// Bytes not yet consumed, silences excluded
    pub fn pending(&self) -> usize {
        self.inbound
            .iter()
            .filter(|item| matches!(item, Inbound::Byte(_)))
            .count()
    }

    /// Everything sent so far
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Everything sent so far, as text
    pub fn sent_text(&self) -> String {
        String::from_utf8_lossy(&self.sent).into_owned()
    }

    /// Drain the record of sent bytes
    pub fn take_sent(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for MockTransport {
    fn send(&mut self, bytes: &[u8]) -> AppResult<()> {
        if self.fail_sends {
            return Err(KuwaharaError::Transport("mock link closed".to_string()));
        }
        self.sent.extend_from_slice(bytes);
        Ok(())
    }

    fn receive_byte(&mut self, _timeout: Duration) -> AppResult<Option<u8>> {
        Ok(match self.inbound.pop_front() {
            Some(Inbound::Byte(byte)) => Some(byte),
            Some(Inbound::Silence) | None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_times_out_once() {
        let mut link = MockTransport::with_input(b"a");
        link.push_silence();
        link.push_bytes(b"b");

        let t = Duration::from_millis(1);
        assert_eq!(link.receive_byte(t).unwrap(), Some(b'a'));
        assert_eq!(link.receive_byte(t).unwrap(), None);
        assert_eq!(link.receive_byte(t).unwrap(), Some(b'b'));
        assert_eq!(link.receive_byte(t).unwrap(), None);
    }

    #[test]
    fn failed_send_is_recoverable_error() {
        let mut link = MockTransport::new();
        link.fail_sends();
        let err = link.send(b"x").unwrap_err();
        assert!(err.is_recoverable());
        assert!(link.sent().is_empty());
    }
}
