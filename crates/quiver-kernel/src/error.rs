//! Error types for the script manager.

use quiver_core::{GateDecision, ScriptPath};
use quiver_registry::{RegistryError, WatchError};
use thiserror::Error;

/// Errors returned by [`ScriptManager`](crate::ScriptManager) operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// A catalog operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// File watching could not start.
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// The script already has an active run.
    #[error("script is already running: {0}")]
    AlreadyRunning(ScriptPath),

    /// The run gate refused the script.
    #[error("script may not run: {path}")]
    NotAllowed {
        /// The refused script.
        path: ScriptPath,
        /// The gate's answer, with reasons.
        decision: GateDecision,
    },
}

/// Result type for script manager operations.
pub type KernelResult<T> = Result<T, KernelError>;
