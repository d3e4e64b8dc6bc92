//! Quiver Test - Shared test utilities.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! quiver-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use quiver_test::{ScriptDir, WORKED_EXAMPLE, python_available};
//!
//! #[tokio::test]
//! async fn test_run() {
//!     if !python_available() {
//!         return;
//!     }
//!     let dir = ScriptDir::new().with_script("ab.py", WORKED_EXAMPLE);
//!     // ...
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod script_dir;

pub use fixtures::*;
pub use script_dir::ScriptDir;

/// Whether a `python3` interpreter is on `PATH`.
///
/// Tests that execute scripts return early when this is `false`.
#[must_use]
pub fn python_available() -> bool {
    which::which("python3").is_ok()
}

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `warn`.
pub fn init_test_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
