//! Resident deployment profile.
//!
//! The whole image lives in memory, so no rolling buffer or handshake is
//! needed: the runner filters the full grid into a fresh result and prints
//! it, header first, over the transport. Devices built this way repeat the
//! output on a fixed period so a late-attached terminal still sees it.

use crate::codec::encode_pgm;
use crate::config::FilterConfig;
use crate::error::AppResult;
use crate::filter::KuwaharaFilter;
use crate::image::GrayImage;
use crate::transport::Transport;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Default pause between repeated emissions.
pub const RESIDENT_PERIOD: Duration = Duration::from_secs(5);

/// Filters a resident image and prints the result.
pub struct ResidentRunner<T: Transport> {
    filter: KuwaharaFilter,
    image: GrayImage,
    transport: T,
    period: Duration,
}

impl<T: Transport> ResidentRunner<T> {
    /// Create a runner for `image`
    pub fn new(config: &FilterConfig, image: GrayImage, transport: T) -> AppResult<Self> {
        Ok(Self {
            filter: KuwaharaFilter::from_config(config)?,
            image,
            transport,
            period: RESIDENT_PERIOD,
        })
    }

    /// Pause between emissions in [`run`](Self::run)
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Give back the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Filter once and send the result; the source image is left untouched.
    pub fn emit_once(&mut self) -> AppResult<GrayImage> {
        let result = self.filter.filter(&self.image);
        self.transport.send(encode_pgm(&result).as_bytes())?;
        debug!("Emitted {} filtered rows", result.height());
        Ok(result)
    }

    /// Emit repeatedly; `max_runs` of `None` never returns on success.
    pub fn run(&mut self, max_runs: Option<u64>) -> AppResult<()> {
        info!(
            "Resident filtering of {}x{} image every {:?}",
            self.image.width(),
            self.image.height(),
            self.period
        );
        let mut runs = 0;
        while max_runs.map_or(true, |max| runs < max) {
            self.emit_once()?;
            runs += 1;
            thread::sleep(self.period);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn prints_header_then_rows_each_run() {
        let image = GrayImage::filled(3, 3, 255, 100);
        let config = FilterConfig {
            image_size: 3,
            buffer_capacity: 3,
            ..FilterConfig::default()
        };
        let mut runner = ResidentRunner::new(&config, image, MockTransport::new())
            .unwrap()
            .with_period(Duration::ZERO);
        runner.run(Some(2)).unwrap();

        let once = "P2\n3 3\n255\n100 100 100\n100 100 100\n100 100 100\n";
        assert_eq!(runner.into_transport().sent_text(), once.repeat(2));
    }
}
