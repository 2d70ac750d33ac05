//! rvm telemetry - logging for the runtime bootstrapper.
//!
//! This crate provides:
//! - A serializable [`LogConfig`] with builder methods
//! - Multiple output formats and targets (stderr, stdout, rolling files)
//! - A local wall-clock timer matching the `YYYY-MM-DD HH:MM:SS` log prefix
//!
//! # Example
//!
//! ```rust,no_run
//! use rvm_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), rvm_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("rvm_control=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("bootstrapper starting");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_logging};
