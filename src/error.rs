//! Custom error types for the filter and its streaming transport.
//!
//! This module defines the crate-wide error type, `KuwaharaError`. Using the
//! `thiserror` crate, it gives every layer (configuration, text codecs, the
//! byte transport and the streaming controller) one consistent error surface
//! so that `?` works end to end.
//!
//! ## Error Hierarchy
//!
//! - **`RowTimeout`**: a row of pixel values was not completed before the
//!   per-byte receive bound expired. Raised by the line codec while the
//!   controller fills its rolling buffer.
//! - **`GoTimeout`**: the peer never sent the go token after the ready token.
//! - **`ReadyTimeout`**: the host side's mirror image, waiting for the device.
//! - **`Config`** / **`Configuration`**: figment extraction failures and
//!   semantic validation failures respectively.
//! - **`Io`** / **`Transport`**: file-system errors and non-timeout link
//!   failures (a vanished serial port, a closed in-memory channel).
//! - **`Format`** / **`DimensionMismatch`**: malformed plain-text images and
//!   images whose geometry does not match what the caller expected.
//!
//! A quadrant whose samples are not resident in the rolling buffer is not an
//! error at all: the engine silently excludes it from the dispersion search.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type AppResult<T> = std::result::Result<T, KuwaharaError>;

/// Every failure the crate can report.
#[derive(Error, Debug)]
pub enum KuwaharaError {
    /// A row did not complete within the per-byte receive bound.
    #[error("Row {row} timed out after {received} of {expected} values")]
    RowTimeout {
        /// Global image row being received.
        row: usize,
        /// Values decoded before the link went quiet.
        received: usize,
        /// Values a complete row carries.
        expected: usize,
    },

    /// The go token was not observed after the ready token was sent.
    #[error("Go token not received within {waited:?}")]
    GoTimeout {
        /// Total time spent scanning for the token.
        waited: Duration,
    },

    /// The ready token was not observed while waiting on the device.
    #[error("Ready token not received within {waited:?}")]
    ReadyTimeout {
        /// Total time spent scanning for the token.
        waited: Duration,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed image data: {0}")]
    Format(String),

    #[error("Dimension mismatch: expected {expected_width}x{expected_height}, found {width}x{height}")]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("Serial support not enabled. Rebuild with --features instrument_serial")]
    SerialFeatureDisabled,
}

impl KuwaharaError {
    /// Whether the streaming controller may restart its cycle after this error.
    ///
    /// Only local configuration and file-format problems are permanent; every
    /// link-level failure is cured by starting over at phase 1.
    pub fn is_recoverable(&self) -> bool {
        match self {
            KuwaharaError::RowTimeout { .. }
            | KuwaharaError::GoTimeout { .. }
            | KuwaharaError::ReadyTimeout { .. }
            | KuwaharaError::Transport(_)
            | KuwaharaError::Io(_) => true,
            KuwaharaError::Config(_)
            | KuwaharaError::Configuration(_)
            | KuwaharaError::Format(_)
            | KuwaharaError::DimensionMismatch { .. }
            | KuwaharaError::SerialFeatureDisabled => false,
        }
    }
}
