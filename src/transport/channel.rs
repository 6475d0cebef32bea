//! In-memory full-duplex byte link.
//!
//! Two [`ChannelTransport`] ends connected by a pair of `mpsc` channels. Each
//! `send` ships one chunk; the receiving end splits chunks back into bytes.
//! Used to run the device controller and the host peer on separate threads.

use super::Transport;
use crate::error::{AppResult, KuwaharaError};
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// One end of an in-memory link.
#[derive(Debug)]
pub struct ChannelTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
}

impl ChannelTransport {
    /// Create two connected ends
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel();
        let (b_tx, a_rx) = mpsc::channel();

        (
            Self {
                tx: a_tx,
                rx: a_rx,
                pending: VecDeque::new(),
            },
            Self {
                tx: b_tx,
                rx: b_rx,
                pending: VecDeque::new(),
            },
        )
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, bytes: &[u8]) -> AppResult<()> {
        self.tx
            .send(bytes.to_vec())
            .map_err(|_| KuwaharaError::Transport("peer end dropped".to_string()))
    }

    fn receive_byte(&mut self, timeout: Duration) -> AppResult<Option<u8>> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(byte) = self.pending.pop_front() {
                return Ok(Some(byte));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(chunk) => self.pending.extend(chunk),
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(KuwaharaError::Transport("peer end dropped".to_string()))
                }
            }
        }
    }
}
