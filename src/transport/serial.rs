//! Serial-port transport.
//!
//! Wraps the `serialport` crate behind the [`Transport`] trait. The port is
//! opened in blocking mode; each `receive_byte` call re-arms the port timeout
//! only when the requested bound differs from the previous one.
//!
//! Without the `instrument_serial` feature the type still exists so that
//! configuration and CLI code compile unchanged, but [`SerialTransport::open`]
//! reports [`KuwaharaError::SerialFeatureDisabled`].

use super::Transport;
use crate::config::TransportSettings;
use crate::error::{AppResult, KuwaharaError};
use std::time::Duration;

#[cfg(feature = "instrument_serial")]
use serialport::SerialPort;
#[cfg(feature = "instrument_serial")]
use std::io::{Read, Write};
#[cfg(feature = "instrument_serial")]
use tracing::debug;

/// Builder for [`SerialTransport`].
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use kuwahara_stream::transport::SerialTransportBuilder;
///
/// let link = SerialTransportBuilder::new("/dev/ttyACM0", 115_200)
///     .with_write_timeout(Duration::from_millis(500))
///     .open();
/// ```
#[derive(Debug, Clone)]
pub struct SerialTransportBuilder {
    port_name: String,
    baud_rate: u32,
    write_timeout: Duration,
}

impl SerialTransportBuilder {
    /// Create a builder with required parameters
    ///
    /// Default write timeout: 1 second
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            write_timeout: Duration::from_secs(1),
        }
    }

    /// Seed a builder from the `[transport]` configuration section
    pub fn from_settings(settings: &TransportSettings) -> Self {
        Self::new(settings.port.clone(), settings.baud_rate)
            .with_write_timeout(settings.write_timeout)
    }

    /// Bound on how long a single send may block
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Open the port
    pub fn open(self) -> AppResult<SerialTransport> {
        SerialTransport::open(self)
    }
}

/// Blocking serial link.
pub struct SerialTransport {
    port_name: String,
    #[cfg_attr(not(feature = "instrument_serial"), allow(dead_code))]
    write_timeout: Duration,
    #[cfg(feature = "instrument_serial")]
    port: Box<dyn SerialPort>,
    #[cfg(feature = "instrument_serial")]
    armed_timeout: Duration,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port_name", &self.port_name)
            .finish_non_exhaustive()
    }
}

impl SerialTransport {
    /// Open the port described by `builder`
    pub fn open(builder: SerialTransportBuilder) -> AppResult<Self> {
        #[cfg(feature = "instrument_serial")]
        {
            let port = serialport::new(&builder.port_name, builder.baud_rate)
                .timeout(builder.write_timeout)
                .open()
                .map_err(|e| {
                    KuwaharaError::Transport(format!(
                        "failed to open serial port '{}' at {} baud: {}",
                        builder.port_name, builder.baud_rate, e
                    ))
                })?;

            debug!(
                "Serial port '{}' opened at {} baud",
                builder.port_name, builder.baud_rate
            );

            Ok(Self {
                port_name: builder.port_name,
                write_timeout: builder.write_timeout,
                port,
                armed_timeout: builder.write_timeout,
            })
        }

        #[cfg(not(feature = "instrument_serial"))]
        {
            let _ = builder;
            Err(KuwaharaError::SerialFeatureDisabled)
        }
    }

    /// Device path this transport is bound to
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    #[cfg(feature = "instrument_serial")]
    fn arm(&mut self, timeout: Duration) -> AppResult<()> {
        if self.armed_timeout != timeout {
            self.port
                .set_timeout(timeout)
                .map_err(|e| KuwaharaError::Transport(format!("set timeout: {}", e)))?;
            self.armed_timeout = timeout;
        }
        Ok(())
    }
}

#[cfg(feature = "instrument_serial")]
impl Transport for SerialTransport {
    fn send(&mut self, bytes: &[u8]) -> AppResult<()> {
        self.arm(self.write_timeout)?;
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn receive_byte(&mut self, timeout: Duration) -> AppResult<Option<u8>> {
        self.arm(timeout)?;

        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Ok(Some(byte[0])),
            Ok(_) => Err(KuwaharaError::Transport(format!(
                "serial port '{}' closed",
                self.port_name
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(not(feature = "instrument_serial"))]
impl Transport for SerialTransport {
    fn send(&mut self, _bytes: &[u8]) -> AppResult<()> {
        Err(KuwaharaError::SerialFeatureDisabled)
    }

    fn receive_byte(&mut self, _timeout: Duration) -> AppResult<Option<u8>> {
        Err(KuwaharaError::SerialFeatureDisabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_takes_settings() {
        let settings = TransportSettings {
            port: "/dev/ttyUSB3".to_string(),
            baud_rate: 9600,
            write_timeout: Duration::from_millis(250),
            ..TransportSettings::default()
        };
        let builder = SerialTransportBuilder::from_settings(&settings);
        assert_eq!(builder.port_name, "/dev/ttyUSB3");
        assert_eq!(builder.baud_rate, 9600);
        assert_eq!(builder.write_timeout, Duration::from_millis(250));
    }

    #[cfg(not(feature = "instrument_serial"))]
    #[test]
    fn open_without_feature_is_rejected() {
        let result = SerialTransportBuilder::new("/dev/null", 115_200).open();
        assert!(matches!(result, Err(KuwaharaError::SerialFeatureDisabled)));
    }
}
