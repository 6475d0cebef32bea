//! Row codec for the streaming link.
//!
//! Rows arrive as ASCII decimal integers. Any non-digit byte delimits a
//! value, so spaces, tabs, `\r` and `\n` are interchangeable; runs of
//! delimiters count once. A row is complete when its `width`-th value has
//! been terminated by a delimiter. Values above `max_value` saturate.

use super::encode_row_into;
use crate::config::FilterConfig;
use crate::error::{AppResult, KuwaharaError};
use crate::image::Pixel;
use crate::transport::Transport;
use std::time::Duration;

/// Incremental decoder for one row, fed a byte at a time.
#[derive(Debug, Clone)]
pub struct RowDecoder {
    width: usize,
    max_value: Pixel,
    pending: Option<u32>,
    values: Vec<Pixel>,
}

impl RowDecoder {
    /// Decoder for rows of `width` values
    pub fn new(width: usize, max_value: Pixel) -> Self {
        Self {
            width,
            max_value,
            pending: None,
            values: Vec::with_capacity(width),
        }
    }

    /// Feed one byte; returns `true` once the row is complete.
    ///
    /// Bytes fed after completion are ignored until [`RowDecoder::reset`].
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_complete() {
            return true;
        }

        if byte.is_ascii_digit() {
            let digit = u32::from(byte - b'0');
            let acc = self.pending.unwrap_or(0);
            self.pending = Some(
                acc.saturating_mul(10)
                    .saturating_add(digit)
                    .min(u32::from(self.max_value)),
            );
        } else if let Some(value) = self.pending.take() {
            // Clamped to max_value above
            self.values.push(value as Pixel);
        }

        self.is_complete()
    }

    /// Whether `width` values have been decoded
    pub fn is_complete(&self) -> bool {
        self.values.len() >= self.width
    }

    /// Values decoded so far
    pub fn values(&self) -> &[Pixel] {
        &self.values
    }

    /// Start over for the next row
    pub fn reset(&mut self) {
        self.pending = None;
        self.values.clear();
    }
}

/// Encoder and decoder for rows of a fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCodec {
    width: usize,
    max_value: Pixel,
}

impl LineCodec {
    /// Codec for rows of `width` values bounded by `max_value`
    pub fn new(width: usize, max_value: Pixel) -> Self {
        Self { width, max_value }
    }

    /// Codec for the configured image width
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.image_size, config.max_value)
    }

    /// Values per row
    pub fn width(&self) -> usize {
        self.width
    }

    /// Encode one row, newline included
    pub fn encode_row(&self, row: &[Pixel]) -> String {
        let mut out = String::with_capacity(row.len() * 4);
        encode_row_into(row, &mut out);
        out
    }

    /// Image header for a `width x height` image
    pub fn encode_header(&self, height: usize) -> String {
        super::encode_header(self.width, height, self.max_value)
    }

    /// Receive one row from `transport` into `dest`.
    ///
    /// `timeout` bounds the wait for each byte, not the whole row. Values
    /// decoded before a timeout are still written to the front of `dest`.
    ///
    /// # Errors
    /// `RowTimeout` naming `global_row` when the link goes quiet mid-row;
    /// link failures propagate unchanged.
    pub fn receive_row<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        global_row: usize,
        dest: &mut [Pixel],
        timeout: Duration,
    ) -> AppResult<()> {
        let mut decoder = RowDecoder::new(self.width, self.max_value);

        loop {
            let Some(byte) = transport.receive_byte(timeout)? else {
                let received = decoder.values().len();
                dest[..received].copy_from_slice(decoder.values());
                return Err(KuwaharaError::RowTimeout {
                    row: global_row,
                    received,
                    expected: self.width,
                });
            };

            if decoder.push(byte) {
                dest[..self.width].copy_from_slice(decoder.values());
                return Ok(());
            }
        }
    }

    /// Parse a complete text line, as captured by the host side.
    ///
    /// Stricter than the byte decoder: every token must be a number no
    /// larger than `max_value`, and there must be exactly `width` of them.
    pub fn parse_line(&self, line: &str) -> AppResult<Vec<Pixel>> {
        let values = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<Pixel>()
                    .ok()
                    .filter(|&v| v <= self.max_value)
                    .ok_or_else(|| KuwaharaError::Format(format!("invalid sample '{}'", token)))
            })
            .collect::<AppResult<Vec<_>>>()?;

        if values.len() != self.width {
            return Err(KuwaharaError::Format(format!(
                "row has {} values, expected {}",
                values.len(),
                self.width
            )));
        }
        Ok(values)
    }
}
