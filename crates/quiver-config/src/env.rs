//! `QUIVER_*` environment variable overrides.
//!
//! Environment variables are the highest-precedence layer. Each one maps to
//! exactly one field:
//!
//! | Variable | Field |
//! |---|---|
//! | `QUIVER_SCRIPT_DIRS` | `registry.script_dirs` (platform path-list) |
//! | `QUIVER_INTERPRETER` | `runner.interpreter` |
//! | `QUIVER_LOG_LEVEL` | `logging.level` |
//! | `QUIVER_DEBOUNCE_MS` | `watcher.debounce_ms` |

use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, set_field};

/// Prefix shared by every recognized variable.
pub const ENV_PREFIX: &str = "QUIVER_";

/// Snapshot the `QUIVER_*` variables of the current process.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .collect()
}

/// Apply recognized overrides from `env_vars` onto the merged tree.
///
/// Empty values are ignored. Returns how many fields were overridden.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] if `QUIVER_DEBOUNCE_MS` is not a
/// non-negative integer.
pub fn apply_env_overrides(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<usize> {
    let mut applied = 0_usize;
    let layer = ConfigLayer::Environment;
    let present = |name: &str| env_vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(raw) = present("QUIVER_SCRIPT_DIRS") {
        let dirs = std::env::split_paths(raw)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| toml::Value::String(p.to_string_lossy().into_owned()))
            .collect();
        set_field(merged, "registry.script_dirs", toml::Value::Array(dirs), &layer, sources);
        applied = applied.saturating_add(1);
    }

    if let Some(raw) = present("QUIVER_INTERPRETER") {
        set_field(
            merged,
            "runner.interpreter",
            toml::Value::String(raw.to_owned()),
            &layer,
            sources,
        );
        applied = applied.saturating_add(1);
    }

    if let Some(raw) = present("QUIVER_LOG_LEVEL") {
        set_field(
            merged,
            "logging.level",
            toml::Value::String(raw.to_lowercase()),
            &layer,
            sources,
        );
        applied = applied.saturating_add(1);
    }

    if let Some(raw) = present("QUIVER_DEBOUNCE_MS") {
        let ms: i64 = raw
            .parse()
            .ok()
            .filter(|ms| *ms >= 0)
            .ok_or_else(|| ConfigError::ValidationError {
                field: "QUIVER_DEBOUNCE_MS".to_owned(),
                message: format!("expected a non-negative integer, got '{raw}'"),
            })?;
        set_field(merged, "watcher.debounce_ms", toml::Value::Integer(ms), &layer, sources);
        applied = applied.saturating_add(1);
    }

    Ok(applied)
}
