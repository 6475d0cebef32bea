//! Subscriber setup for the `kuwahara` binary.
//!
//! The configured level is the default directive; `RUST_LOG` still wins when
//! set. Thread names are always printed because `simulate` runs the device
//! and the host on separate threads.
//!
//! ```no_run
//! use kuwahara_stream::{config::Settings, tracing_setup};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load()?;
//! tracing_setup::init_from_settings(&settings)?;
//! tracing::warn!(row = 12, "Row timed out");
//! # Ok(())
//! # }
//! ```

use crate::config::Settings;
use crate::error::{AppResult, KuwaharaError};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer,
};

/// Log line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Multi-line, coloured
    #[default]
    Pretty,
    /// One line per event, no colour; suits a serial console
    Compact,
    /// One JSON object per event
    Json,
}

/// Level and layout for the global subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: Level,
    /// Output layout
    pub format: OutputFormat,
}

impl TracingConfig {
    /// Read the `[logging]` section of `settings`
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        Ok(Self {
            level: parse_log_level(&settings.logging.level)?,
            format: settings.logging.format,
        })
    }
}

/// Install the subscriber described by the `[logging]` section
pub fn init_from_settings(settings: &Settings) -> AppResult<()> {
    init(TracingConfig::from_settings(settings)?)
}

/// Install a global subscriber.
///
/// Returns `Ok(())` when one is already installed.
pub fn init(config: TracingConfig) -> AppResult<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.level).into())
        .from_env_lossy();

    let layer = match config.format {
        OutputFormat::Pretty => fmt::layer().pretty().with_thread_names(true).boxed(),
        OutputFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(false)
            .with_thread_names(true)
            .boxed(),
        OutputFormat::Json => fmt::layer().json().with_thread_names(true).boxed(),
    };

    accept_existing_subscriber(tracing_subscriber::registry().with(filter).with(layer).try_init())
}

fn accept_existing_subscriber(result: Result<(), TryInitError>) -> AppResult<()> {
    result.or_else(|e| {
        if e.to_string()
            .contains("a global default trace dispatcher has already been set")
        {
            Ok(())
        } else {
            Err(KuwaharaError::Configuration(format!(
                "Failed to initialize tracing: {}",
                e
            )))
        }
    })
}

/// Parse a case-insensitive level name
pub(crate) fn parse_log_level(level: &str) -> AppResult<Level> {
    level.parse::<Level>().map_err(|_| {
        KuwaharaError::Configuration(format!(
            "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
            level
        ))
    })
}
