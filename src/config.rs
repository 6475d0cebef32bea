//! Configuration System using Figment
//!
//! Strongly-typed configuration for both deployment profiles. Configuration
//! is loaded from:
//! 1. built-in defaults (the reference deployment: 90x90 image, 3x3 window,
//!    sample variance, 46-row buffer)
//! 2. a TOML file (`config/kuwahara.toml` unless a path is given)
//! 3. environment variables prefixed with `KUWAHARA_`, using `__` between
//!    nesting levels (`KUWAHARA_FILTER__WINDOW_SIZE=5`)
//!
//! Everything is constructed once at start-up; nothing here is mutated while
//! an image is being processed.
//!
//! # Example
//! ```no_run
//! use kuwahara_stream::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("window: {}", settings.filter.window_size);
//! # Ok::<(), kuwahara_stream::error::KuwaharaError>(())
//! ```

use crate::error::{AppResult, KuwaharaError};
use crate::filter::{VarianceMode, Window};
use crate::tracing_setup::{self, OutputFormat};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/kuwahara.toml";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "KUWAHARA_";

/// Which firmware shape the filter runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentProfile {
    /// Whole image resident in memory; filtered with a full-grid source.
    Resident,
    /// Image streamed through the rolling buffer by the stream controller.
    #[default]
    Streaming,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Deployment profile
    pub profile: DeploymentProfile,
    /// Filter and buffer geometry
    pub filter: FilterConfig,
    /// Byte link settings
    pub transport: TransportSettings,
    /// Diagnostics
    pub logging: LoggingSettings,
}

/// Filter geometry shared by both profiles.
///
/// `phase_boundary` is not stored: it is derived from `buffer_capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Image side length N (images are N x N in streaming mode)
    pub image_size: usize,
    /// Odd window side W >= 3
    pub window_size: usize,
    /// Dispersion estimator used to rank quadrants
    pub variance_mode: VarianceMode,
    /// Rolling buffer capacity B, in rows
    pub buffer_capacity: usize,
    /// Largest legal sample value
    pub max_value: u16,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            image_size: 90,
            window_size: 3,
            variance_mode: VarianceMode::Sample,
            buffer_capacity: 46,
            max_value: 255,
        }
    }
}

impl FilterConfig {
    /// Validated window derived from `window_size`.
    pub fn window(&self) -> AppResult<Window> {
        Window::new(self.window_size)
    }

    /// Last global row processed in phase 1 (inclusive).
    ///
    /// One row short of the buffer's last row so that row still has its lower
    /// neighbour resident.
    pub fn phase_boundary(&self) -> usize {
        self.buffer_capacity.saturating_sub(2)
    }

    /// Number of rows the peer sends for phase 2.
    pub fn phase2_rows(&self) -> usize {
        self.buffer_capacity
            .min(self.image_size.saturating_sub(self.phase_boundary()))
    }

    /// Check geometry invariants
    pub fn validate(&self) -> AppResult<()> {
        let window = self.window()?;

        if window.size() > self.image_size {
            return Err(KuwaharaError::Configuration(format!(
                "window_size {} exceeds image_size {}",
                window.size(),
                self.image_size
            )));
        }

        if self.buffer_capacity < 3 || self.buffer_capacity > self.image_size {
            return Err(KuwaharaError::Configuration(format!(
                "buffer_capacity {} must be in 3..={}",
                self.buffer_capacity, self.image_size
            )));
        }

        if self.phase_boundary() + self.buffer_capacity < self.image_size {
            return Err(KuwaharaError::Configuration(format!(
                "buffer_capacity {} cannot cover a {}-row image in two phases (needs at least {})",
                self.buffer_capacity,
                self.image_size,
                (self.image_size + 2).div_ceil(2)
            )));
        }

        if self.max_value == 0 {
            return Err(KuwaharaError::Configuration(
                "max_value must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Byte link configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Serial port path (e.g., "/dev/ttyACM0", "COM3")
    pub port: String,
    /// Communication speed
    pub baud_rate: u32,
    /// Per-byte receive bound while a row is being received
    #[serde(with = "humantime_serde")]
    pub row_timeout: Duration,
    /// Bound on the wait for the go token after the ready token
    #[serde(with = "humantime_serde")]
    pub go_timeout: Duration,
    /// Host-side bound for capturing one phase of filtered rows
    #[serde(with = "humantime_serde")]
    pub capture_timeout: Duration,
    /// Bound on a single send
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 115_200,
            row_timeout: Duration::from_secs(2),
            go_timeout: Duration::from_secs(30),
            capture_timeout: Duration::from_secs(20),
            write_timeout: Duration::from_secs(1),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Logging level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: OutputFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: OutputFormat::Pretty,
        }
    }
}

impl Settings {
    /// Load configuration from the default file and environment variables
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error: defaults and environment overrides
    /// still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let settings: Settings = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        self.filter.validate()?;
        tracing_setup::parse_log_level(&self.logging.level)?;

        let timeouts = [
            ("row_timeout", self.transport.row_timeout),
            ("go_timeout", self.transport.go_timeout),
            ("capture_timeout", self.transport.capture_timeout),
            ("write_timeout", self.transport.write_timeout),
        ];
        for (name, value) in timeouts {
            if value.is_zero() {
                return Err(KuwaharaError::Configuration(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        if self.transport.baud_rate == 0 {
            return Err(KuwaharaError::Configuration(
                "baud_rate must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> AppResult<String> {
        toml::to_string_pretty(self).map_err(|e| KuwaharaError::Configuration(e.to_string()))
    }
}
