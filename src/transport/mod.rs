//! Byte-stream transports between the filtering device and its row-data peer.
//!
//! The protocol only needs two operations, both blocking with a bound:
//! - `send(bytes)`: best-effort write
//! - `receive_byte(timeout)`: one byte, or `None` when the bound expires
//!
//! The timeout is the only cancellation mechanism; nothing interrupts a
//! pending receive from the outside.
//!
//! # Implementations
//!
//! - [`SerialTransport`]: RS-232/USB-serial link via the `serialport` crate
//!   (feature `instrument_serial`)
//! - [`ChannelTransport`]: in-memory full-duplex link for running both roles
//!   in one process
//! - [`MockTransport`]: scripted input and recorded output for tests

pub mod channel;
pub mod mock;
pub mod serial;

pub use channel::ChannelTransport;
pub use mock::MockTransport;
pub use serial::{SerialTransport, SerialTransportBuilder};

use crate::error::AppResult;
use std::time::Duration;

/// Blocking byte link with bounded waits.
pub trait Transport {
    /// Write all of `bytes` to the peer.
    fn send(&mut self, bytes: &[u8]) -> AppResult<()>;

    /// Wait up to `timeout` for one byte.
    ///
    /// `Ok(None)` is the timeout signal; `Err` is reserved for link failures.
    fn receive_byte(&mut self, timeout: Duration) -> AppResult<Option<u8>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, bytes: &[u8]) -> AppResult<()> {
        (**self).send(bytes)
    }

    fn receive_byte(&mut self, timeout: Duration) -> AppResult<Option<u8>> {
        (**self).receive_byte(timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, bytes: &[u8]) -> AppResult<()> {
        (**self).send(bytes)
    }

    fn receive_byte(&mut self, timeout: Duration) -> AppResult<Option<u8>> {
        (**self).receive_byte(timeout)
    }
}
