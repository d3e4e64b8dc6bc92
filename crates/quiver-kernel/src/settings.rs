//! Runtime settings for the script manager.

use std::path::{Path, PathBuf};
use std::time::Duration;

use quiver_config::Config;
use quiver_registry::{DEFAULT_DEBOUNCE, DiscoveryOptions};
use quiver_runner::EngineConfig;

/// Everything a [`ScriptManager`](crate::ScriptManager) needs to start.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Script directories, in priority order.
    pub directories: Vec<PathBuf>,
    /// Which files count as scripts.
    pub discovery: DiscoveryOptions,
    /// Whether front ends should start the file watcher.
    pub watch_enabled: bool,
    /// Watcher debounce window.
    pub debounce: Duration,
    /// Interpreter settings.
    pub engine: EngineConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            discovery: DiscoveryOptions::default(),
            watch_enabled: true,
            debounce: DEFAULT_DEBOUNCE,
            engine: EngineConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Default settings for the given directories.
    #[must_use]
    pub fn new(directories: Vec<PathBuf>) -> Self {
        Self {
            directories,
            ..Self::default()
        }
    }

    /// Set the watcher debounce window.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the interpreter settings.
    #[must_use]
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Build settings from loaded configuration.
    ///
    /// `~` in script directories expands to `home`. Relative directories are
    /// resolved against `base`.
    #[must_use]
    pub fn from_config(config: &Config, home: Option<&Path>, base: &Path) -> Self {
        let engine = EngineConfig {
            interpreter: config.runner.interpreter.clone(),
            timeout: config.runner.timeout(),
            cancel_grace: config.runner.cancel_grace(),
            clean_env: config.runner.clean_env,
        };
        Self {
            directories: config.registry.resolve_dirs(home, base),
            discovery: DiscoveryOptions {
                extensions: config.registry.extensions.clone(),
                recursive: config.registry.recursive,
            },
            watch_enabled: config.watcher.enabled,
            debounce: config.watcher.debounce(),
            engine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let config = Config::default();
        let settings =
            ManagerConfig::from_config(&config, Some(Path::new("/home/u")), Path::new("/ws"));

        assert_eq!(
            settings.directories,
            vec![PathBuf::from("/home/u/.quiver/scripts")]
        );
        assert_eq!(settings.discovery, DiscoveryOptions::default());
        assert_eq!(settings.debounce, Duration::from_millis(300));
        assert_eq!(settings.engine.interpreter, "python3");
        assert!(settings.engine.timeout.is_none());
        assert!(settings.watch_enabled);
    }

    #[test]
    fn test_runner_section_is_carried_over() {
        let mut config = Config::default();
        config.runner.interpreter = "/opt/py/bin/python".into();
        config.runner.timeout_secs = 5;
        config.runner.clean_env = true;

        let settings = ManagerConfig::from_config(&config, None, Path::new("/ws"));
        assert_eq!(settings.engine.interpreter, "/opt/py/bin/python");
        assert_eq!(settings.engine.timeout, Some(Duration::from_secs(5)));
        assert!(settings.engine.clean_env);
    }
}
