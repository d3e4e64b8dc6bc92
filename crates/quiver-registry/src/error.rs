//! Error types for the registry and the watcher.

use std::path::PathBuf;

use quiver_core::{CoreError, ScriptPath};
use thiserror::Error;

/// Errors that can occur in registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No script is registered under this path.
    #[error("script not found: {0}")]
    NotFound(ScriptPath),

    /// A script file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A script directory could not be scanned.
    #[error("failed to scan {dir}: {message}")]
    Discovery {
        /// Directory that failed.
        dir: PathBuf,
        /// What went wrong.
        message: String,
    },
}

impl From<CoreError> for RegistryError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Read { path, source } => Self::Io { path, source },
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that stop the file watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The platform watcher could not be created.
    #[error("failed to initialize filesystem watcher: {0}")]
    Init(String),

    /// None of the configured directories could be watched.
    #[error("no watchable script directories")]
    NoWatchableDirectories,
}

/// Result type for watcher operations.
pub type WatchResult<T> = Result<T, WatchError>;
