//! CLI theme and styling.

use colored::Colorize;
use quiver_core::ValidationVerdict;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format an info message.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }

    /// Format a key-value pair.
    pub(crate) fn kv(key: &str, value: &str) -> String {
        format!("{}: {}", key.bold(), value)
    }

    /// Format a timestamp.
    pub(crate) fn timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
        dt.format("%Y-%m-%d %H:%M").to_string().dimmed().to_string()
    }

    /// Short colored badge for a screening verdict.
    pub(crate) fn verdict(verdict: &ValidationVerdict) -> String {
        match verdict {
            ValidationVerdict::Clean => "clean".green().to_string(),
            ValidationVerdict::Flagged(reasons) => {
                format!("flagged ({})", reasons.len()).yellow().to_string()
            },
            ValidationVerdict::ParseFailed(_) => "unparseable".red().to_string(),
        }
    }

    /// Format a line of script stderr.
    pub(crate) fn stderr_line(text: &str) -> String {
        format!("{}", text.red())
    }
}
