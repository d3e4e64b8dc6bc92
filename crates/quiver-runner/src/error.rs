use thiserror::Error;

/// Errors inside a run.
///
/// [`ExecutionEngine::run`](crate::ExecutionEngine::run) never returns these;
/// they are folded into a `Failed` outcome with their display text.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The interpreter process could not be started.
    #[error("failed to start interpreter: {0}")]
    Spawn(#[source] std::io::Error),
    /// Waiting on the interpreter process failed.
    #[error("failed waiting for interpreter: {0}")]
    Wait(#[source] std::io::Error),
    /// The script ran longer than the configured limit.
    #[error("timed out after {0}")]
    TimedOut(String),
}

/// Result type for runner internals.
pub type RunnerResult<T> = Result<T, RunnerError>;
