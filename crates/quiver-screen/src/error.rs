//! Screening errors.
//!
//! These never escape [`validate_source`](crate::validate_source): source
//! problems become [`ParseFailed`](quiver_core::ValidationVerdict::ParseFailed)
//! verdicts. Only rule construction surfaces them to callers.

use thiserror::Error;

/// Errors raised while preparing or lexing source.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// A triple-quoted string was never closed.
    #[error("unterminated string literal starting at line {line}")]
    UnterminatedString {
        /// 1-based line where the literal opens.
        line: usize,
    },
    /// A rule pattern failed to compile.
    #[error("invalid pattern for rule {name}: {source}")]
    InvalidRule {
        /// Rule name.
        name: String,
        /// Regex compile error.
        #[source]
        source: regex::Error,
    },
}

/// Result type for screening operations.
pub type ScreenResult<T> = Result<T, ScreenError>;
