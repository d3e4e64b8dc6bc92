//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge `~/.quiver/config.toml` (user)
//! 3. Merge `{workspace}/.quiver/config.toml` (workspace)
//! 4. Apply `QUIVER_*` environment overrides
//! 5. Deserialize merged tree → `Config`
//! 6. Validate
//! 7. Return `ResolvedConfig`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_overrides, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Directory name used for both the user and workspace layers.
pub const CONFIG_DIR_NAME: &str = ".quiver";

/// Load the configuration with layered precedence.
///
/// `workspace_root` is the project root; if `None`, the workspace layer is
/// skipped. `home_override` replaces the detected home directory for the
/// user layer.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// final merged configuration fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    let home = match home_override {
        Some(h) => h.to_path_buf(),
        None => home_directory()?,
    };
    load_with_env(workspace_root, &home, &collect_env_vars())
}

/// [`load`] with an explicit home directory and environment snapshot.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_with_env(
    workspace_root: Option<&Path>,
    home: &Path,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    // 1. Embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", &ConfigLayer::Defaults, &mut field_sources);

    // 2-3. User then workspace files.
    let mut layers = vec![(user_config_path(home), ConfigLayer::User)];
    if let Some(root) = workspace_root {
        layers.push((
            root.join(CONFIG_DIR_NAME).join("config.toml"),
            ConfigLayer::Workspace,
        ));
    }

    for (path, layer) in layers {
        if let Some(overlay) = try_load_file(&path)? {
            deep_merge_tracking(&mut merged, &overlay, "", &layer, &mut field_sources);
            loaded_files.push(path.display().to_string());
            info!(path = %path.display(), layer = %layer, "Loaded config file");
        }
    }

    // 4. Environment.
    let env_count = apply_env_overrides(&mut merged, &mut field_sources, env_vars)?;
    if env_count > 0 {
        debug!(count = env_count, "Applied environment overrides");
    }

    // 5. Deserialize.
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 6. Validate.
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Path of the user-level config file under `home`.
#[must_use]
pub fn user_config_path(home: &Path) -> PathBuf {
    home.join(CONFIG_DIR_NAME).join("config.toml")
}

/// Determine the user's home directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] when the platform reports none.
pub fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

/// Try to load a file, returning `None` if it doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, body: &str) {
        let cfg_dir = dir.join(CONFIG_DIR_NAME);
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(cfg_dir.join("config.toml"), body).unwrap();
    }

    #[test]
    fn test_defaults_deserialize_to_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config.registry.extensions, vec!["py"]);
        assert_eq!(config.watcher.debounce_ms, 300);
        assert_eq!(config.runner.interpreter, "python3");
        assert_eq!(config.logging.format, "compact");
    }

    #[test]
    fn test_load_defaults_only() {
        let home = tempfile::tempdir().unwrap();
        let resolved = load_with_env(None, home.path(), &HashMap::new()).unwrap();
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(
            resolved.source_of("runner.interpreter"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_layer_precedence() {
        let home = tempfile::tempdir().unwrap();
        let ws = tempfile::tempdir().unwrap();
        write_config(
            home.path(),
            "[runner]\ninterpreter = \"python3.11\"\ntimeout_secs = 30\n",
        );
        write_config(ws.path(), "[runner]\ninterpreter = \"python3.12\"\n");

        let resolved = load_with_env(Some(ws.path()), home.path(), &HashMap::new()).unwrap();
        assert_eq!(resolved.config.runner.interpreter, "python3.12");
        assert_eq!(resolved.config.runner.timeout_secs, 30);
        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(
            resolved.source_of("runner.timeout_secs"),
            Some(&ConfigLayer::User)
        );
        assert_eq!(
            resolved.source_of("runner.interpreter"),
            Some(&ConfigLayer::Workspace)
        );

        let env = HashMap::from([("QUIVER_INTERPRETER".to_owned(), "pypy3".to_owned())]);
        let resolved = load_with_env(Some(ws.path()), home.path(), &env).unwrap();
        assert_eq!(resolved.config.runner.interpreter, "pypy3");
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let home = tempfile::tempdir().unwrap();
        write_config(home.path(), "[runner\ninterpreter = ");
        let err = load_with_env(None, home.path(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_invalid_merged_value_fails_validation() {
        let home = tempfile::tempdir().unwrap();
        write_config(home.path(), "[watcher]\ndebounce_ms = 60000\n");
        let err = load_with_env(None, home.path(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_try_load_file_missing() {
        assert!(
            try_load_file(Path::new("/nonexistent/quiver/config.toml"))
                .unwrap()
                .is_none()
        );
    }
}
