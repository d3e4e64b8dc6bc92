//! Quiver Runner - monitored execution of Python scripts.
//!
//! Each run starts a fresh interpreter with a small bootstrap program that
//! picks the script's entry point, streams stdout and stderr line by line,
//! and reports uncaught exceptions as a structured failure record instead of
//! a raw traceback.
//!
//! # Example
//!
//! ```rust,no_run
//! use quiver_core::{ScriptEntry, ScriptPath};
//! use quiver_runner::{EngineConfig, ExecutionEngine};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let entry = ScriptEntry::load(&ScriptPath::new("/scripts/report.py"))?;
//! let engine = ExecutionEngine::new(EngineConfig::default());
//! let (sink, _lines) = tokio::sync::mpsc::unbounded_channel();
//!
//! let result = engine.run(&entry, &sink, &CancellationToken::new()).await;
//! println!("{:?} in {:?}", result.outcome, result.duration);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod bootstrap;
mod engine;
mod entry;
mod env;
mod error;

pub use bootstrap::{FAILURE_SENTINEL, FailureRecord, INTERRUPTED_EXIT_CODE};
pub use engine::{EngineConfig, ExecutionEngine, OutputSink};
pub use entry::{EntryPoint, detect_entry_point};
pub use env::SCRIPT_PATH_VAR;
pub use error::{RunnerError, RunnerResult};
