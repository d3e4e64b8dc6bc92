//! Quiver Telemetry - logging setup for Quiver binaries.
//!
//! Every quiver crate logs through `tracing` macros with structured fields.
//! This crate installs the global subscriber that renders them.
//!
//! # Example
//!
//! ```rust,no_run
//! use quiver_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), quiver_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("quiver_registry=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("Logging ready");
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
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
