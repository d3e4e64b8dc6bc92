//! Error types shared across the core.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building core records from disk.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The script file could not be read.
    #[error("failed to read script {path}: {source}")]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
