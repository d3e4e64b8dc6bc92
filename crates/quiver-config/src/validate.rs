//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Longest accepted debounce window (10 seconds).
const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Longest accepted cancellation grace period (1 minute).
const MAX_CANCEL_GRACE_MS: u64 = 60_000;

/// Validate a fully-merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_registry(config)?;
    validate_watcher(config)?;
    validate_runner(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_registry(config: &Config) -> ConfigResult<()> {
    let r = &config.registry;

    if r.extensions.is_empty() {
        return Err(invalid(
            "registry.extensions",
            "at least one extension is required",
        ));
    }

    for ext in &r.extensions {
        if ext.trim().is_empty() {
            return Err(invalid("registry.extensions", "extensions must not be empty"));
        }
        if ext.starts_with('.') {
            return Err(invalid(
                "registry.extensions",
                format!("extension '{ext}' must not start with a dot"),
            ));
        }
    }

    if r.script_dirs.iter().any(|d| d.trim().is_empty()) {
        return Err(invalid(
            "registry.script_dirs",
            "script directories must not be empty strings",
        ));
    }

    Ok(())
}

fn validate_watcher(config: &Config) -> ConfigResult<()> {
    if config.watcher.debounce_ms > MAX_DEBOUNCE_MS {
        return Err(invalid(
            "watcher.debounce_ms",
            format!(
                "debounce of {} ms exceeds the {MAX_DEBOUNCE_MS} ms limit",
                config.watcher.debounce_ms
            ),
        ));
    }
    Ok(())
}

fn validate_runner(config: &Config) -> ConfigResult<()> {
    let r = &config.runner;

    if r.interpreter.trim().is_empty() {
        return Err(invalid("runner.interpreter", "interpreter must not be empty"));
    }

    if r.cancel_grace_ms > MAX_CANCEL_GRACE_MS {
        return Err(invalid(
            "runner.cancel_grace_ms",
            format!("grace period must be at most {MAX_CANCEL_GRACE_MS} ms"),
        ));
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !matches!(
        l.level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: trace, debug, info, warn, error",
                l.level
            ),
        ));
    }

    if !matches!(l.format.as_str(), "pretty" | "compact" | "json" | "full") {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: pretty, compact, json, full",
                l.format
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_debounce_limit() {
        let mut config = Config::default();
        config.watcher.debounce_ms = MAX_DEBOUNCE_MS;
        assert!(validate(&config).is_ok());
        config.watcher.debounce_ms = 10_001;
        assert_eq!(field_of(validate(&config)), "watcher.debounce_ms");
    }

    #[test]
    fn test_empty_interpreter_rejected() {
        let mut config = Config::default();
        config.runner.interpreter = " ".into();
        assert_eq!(field_of(validate(&config)), "runner.interpreter");
    }

    #[test]
    fn test_dotted_extension_rejected() {
        let mut config = Config::default();
        config.registry.extensions = vec![".py".into()];
        assert_eq!(field_of(validate(&config)), "registry.extensions");
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".into();
        assert_eq!(field_of(validate(&config)), "logging.format");
    }
}
