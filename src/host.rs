//! Host side of the streaming protocol.
//!
//! The host owns the full image and feeds it to the device in two slices,
//! capturing filtered rows as they come back:
//!
//! ```text
//! host                                   device
//!  ── rows 0..B ─────────────────────────▶
//!  ◀──────────────── header, rows 0..=L1 ──
//!  ◀──────────────────────── #READY2#\n ──
//!  ── #GO2# ─────────────────────────────▶
//!  ── rows L1..N ────────────────────────▶
//!  ◀──────────────────── rows L1+1..N ─────
//! ```
//!
//! Empty lines and lines starting with `ERROR` are device diagnostics and
//! are skipped while capturing.

use crate::codec::LineCodec;
use crate::config::{FilterConfig, Settings};
use crate::error::{AppResult, KuwaharaError};
use crate::image::{GrayImage, Pixel};
use crate::protocol::{wait_for_token, GO_TOKEN, READY_MARKER};
use crate::transport::Transport;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Peer that streams an image through a filtering device.
pub struct HostSession<T: Transport> {
    config: FilterConfig,
    codec: LineCodec,
    capture_timeout: Duration,
    transport: T,
}

impl<T: Transport> HostSession<T> {
    /// Create a session; `capture_timeout` bounds each capture step.
    pub fn new(config: FilterConfig, capture_timeout: Duration, transport: T) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            codec: LineCodec::from_config(&config),
            config,
            capture_timeout,
            transport,
        })
    }

    /// Create a session from loaded settings
    pub fn from_settings(settings: &Settings, transport: T) -> AppResult<Self> {
        Self::new(settings.filter, settings.transport.capture_timeout, transport)
    }

    /// Give back the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Stream `image` through the device and assemble the filtered result.
    ///
    /// # Errors
    /// - `DimensionMismatch` if `image` is not `N x N`
    /// - `RowTimeout` naming the first filtered row that never arrived
    /// - `ReadyTimeout` if the device never signals phase 2
    /// - `Format` for an unreadable header or row
    pub fn process(&mut self, image: &GrayImage) -> AppResult<GrayImage> {
        let n = self.config.image_size;
        if image.width() != n || image.height() != n {
            return Err(KuwaharaError::DimensionMismatch {
                expected_width: n,
                expected_height: n,
                width: image.width(),
                height: image.height(),
            });
        }

        let boundary = self.config.phase_boundary();
        let mut rows = Vec::with_capacity(n);

        info!("Phase 1: sending rows 0..{}", self.config.buffer_capacity);
        self.send_rows(image, 0..self.config.buffer_capacity)?;
        let max_value = self.capture_header()?;
        self.capture_rows(0..boundary + 1, &mut rows)?;

        if !wait_for_token(&mut self.transport, READY_MARKER, self.capture_timeout)? {
            return Err(KuwaharaError::ReadyTimeout {
                waited: self.capture_timeout,
            });
        }
        debug!("Ready token received, sending go token");
        self.transport.send(GO_TOKEN)?;

        let end = (boundary + self.config.phase2_rows()).min(n);
        info!("Phase 2: sending rows {}..{}", boundary, end);
        self.send_rows(image, boundary..end)?;
        self.capture_rows(boundary + 1..n, &mut rows)?;

        GrayImage::from_rows(rows, max_value)
    }

    fn send_rows(&mut self, image: &GrayImage, rows: std::ops::Range<usize>) -> AppResult<()> {
        let mut text = String::new();
        for y in rows {
            text.push_str(&self.codec.encode_row(image.row(y)));
        }
        self.transport.send(text.as_bytes())
    }

    /// Wait for the `P2` header and return its max value.
    fn capture_header(&mut self) -> AppResult<Pixel> {
        let deadline = Instant::now() + self.capture_timeout;
        let n = self.config.image_size;
        let timeout = move || KuwaharaError::RowTimeout {
            row: 0,
            received: 0,
            expected: n,
        };

        loop {
            let line = self.next_line(deadline)?.ok_or_else(timeout)?;
            if line == "P2" {
                break;
            }
            debug!("Skipping '{}' before header", line);
        }

        let dims = self.next_line(deadline)?.ok_or_else(timeout)?;
        if dims != format!("{} {}", n, n) {
            return Err(KuwaharaError::Format(format!(
                "device reported dimensions '{}', expected {}x{}",
                dims, n, n
            )));
        }

        let max_line = self.next_line(deadline)?.ok_or_else(timeout)?;
        max_line
            .parse::<Pixel>()
            .map_err(|_| KuwaharaError::Format(format!("invalid max value '{}'", max_line)))
    }

    fn capture_rows(
        &mut self,
        rows: std::ops::Range<usize>,
        out: &mut Vec<Vec<Pixel>>,
    ) -> AppResult<()> {
        let deadline = Instant::now() + self.capture_timeout;
        for y in rows {
            let line = self
                .next_line(deadline)?
                .ok_or(KuwaharaError::RowTimeout {
                    row: y,
                    received: 0,
                    expected: self.config.image_size,
                })?;
            out.push(self.codec.parse_line(&line)?);
        }
        Ok(())
    }

    /// Next meaningful line, or `None` once `deadline` passes.
    fn next_line(&mut self, deadline: Instant) -> AppResult<Option<String>> {
        let mut raw = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            match self.transport.receive_byte(remaining)? {
                None => return Ok(None),
                Some(b'\n') => {
                    let line = String::from_utf8_lossy(&raw).trim().to_string();
                    raw.clear();
                    if line.is_empty() {
                        continue;
                    }
                    if line.starts_with("ERROR") {
                        warn!("Device reported: {}", line);
                        continue;
                    }
                    return Ok(Some(line));
                }
                Some(byte) => raw.push(byte),
            }
        }
    }
}
