//! # Kuwahara Stream Library
//!
//! Edge-preserving Kuwahara smoothing for grayscale images, with a
//! bounded-memory streaming mode for devices that cannot hold the whole image.
//! The library is shared by the `kuwahara` command-line tool and by the
//! integration tests, so both device and host roles are available here.
//!
//! ## Crate Structure
//!
//! - **`filter`**: the quadrant statistics engine. For every pixel it picks
//!   the most homogeneous of four window quadrants and returns its mean.
//! - **`image`**: the `GrayImage` grid, the `ImageSource` trait the engine
//!   reads through, reflect-101 border handling and the rolling row buffer.
//! - **`codec`**: plain-text rows and whole `P2` graymap files.
//! - **`transport`**: the byte-link trait plus serial, in-memory channel and
//!   scripted mock implementations.
//! - **`protocol`**: the `#READY2#` / `#GO2#` handshake tokens and matcher.
//! - **`controller`**: the device-side two-phase state machine.
//! - **`host`**: the peer that feeds rows to a device and collects results.
//! - **`resident`**: the whole-image deployment profile.
//! - **`compare`**: difference metrics between two images.
//! - **`config`**: figment-backed settings for every component.
//! - **`error`**: the crate-wide `KuwaharaError` enum.
//! - **`tracing_setup`**: subscriber initialisation for structured logs.

pub mod codec;
pub mod compare;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod host;
pub mod image;
pub mod protocol;
pub mod resident;
pub mod tracing_setup;
pub mod transport;

pub use config::{DeploymentProfile, FilterConfig, Settings};
pub use controller::{CycleReport, CycleState, StreamController, StreamTimeouts};
pub use error::{AppResult, KuwaharaError};
pub use filter::{KuwaharaFilter, VarianceMode, Window};
pub use image::{GrayImage, ImageSource, Pixel};
