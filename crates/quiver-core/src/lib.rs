//! Quiver Core - Foundation types for the Quiver script manager.
//!
//! This crate provides:
//! - [`ScriptPath`], the normalized identity of a script on disk
//! - [`ScriptEntry`], the catalog record for one script
//! - Validation verdicts and gate decisions shared by the screen and approval layers
//! - Execution results produced by the runner
//! - The header metadata parser ([`metadata`])

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod execution;
pub mod metadata;
pub mod path;
pub mod script;
pub mod verdict;

pub use error::{CoreError, CoreResult};
pub use execution::{ExecutionOutcome, ExecutionResult, OutputLine, OutputStream, TraceFrame};
pub use metadata::{ScriptMetadata, humanize_stem, parse_metadata};
pub use path::ScriptPath;
pub use script::ScriptEntry;
pub use verdict::{FlagReason, GateDecision, ValidationVerdict};
