//! Configuration types.
//!
//! All sections use `#[serde(default)]` so any subset of keys may appear in
//! a file; missing keys fall back to the values in `defaults.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where scripts are discovered.
    pub registry: RegistrySection,
    /// File watching.
    pub watcher: WatcherSection,
    /// Script execution.
    pub runner: RunnerSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// RegistrySection
// ---------------------------------------------------------------------------

/// Script discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    /// Script directories. `~/` expands to the home directory; relative
    /// paths resolve against the workspace root.
    pub script_dirs: Vec<String>,
    /// Extensions treated as scripts, without the leading dot.
    pub extensions: Vec<String>,
    /// Scan subdirectories.
    pub recursive: bool,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            script_dirs: vec!["~/.quiver/scripts".to_owned()],
            extensions: vec!["py".to_owned()],
            recursive: false,
        }
    }
}

impl RegistrySection {
    /// Resolve [`script_dirs`](Self::script_dirs) into absolute paths.
    ///
    /// `home` is used for `~/` expansion and `base` for relative entries.
    /// Entries that need a missing `home` are dropped.
    #[must_use]
    pub fn resolve_dirs(&self, home: Option<&Path>, base: &Path) -> Vec<PathBuf> {
        self.script_dirs
            .iter()
            .filter_map(|raw| {
                if raw == "~" {
                    return home.map(Path::to_path_buf);
                }
                if let Some(rest) = raw.strip_prefix("~/") {
                    return home.map(|h| h.join(rest));
                }
                let path = PathBuf::from(raw);
                Some(if path.is_absolute() {
                    path
                } else {
                    base.join(path)
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// WatcherSection
// ---------------------------------------------------------------------------

/// File watching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherSection {
    /// Watch script directories for changes.
    pub enabled: bool,
    /// Debounce window in milliseconds.
    pub debounce_ms: u64,
}

impl Default for WatcherSection {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 300,
        }
    }
}

impl WatcherSection {
    /// Debounce window as a [`Duration`].
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// ---------------------------------------------------------------------------
// RunnerSection
// ---------------------------------------------------------------------------

/// Script execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    /// Interpreter binary name or path.
    pub interpreter: String,
    /// Run timeout in seconds; `0` disables it.
    pub timeout_secs: u64,
    /// Grace period between the interrupt and the kill on cancellation.
    pub cancel_grace_ms: u64,
    /// Start scripts with only an allowlisted environment.
    pub clean_env: bool,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_owned(),
            timeout_secs: 0,
            cancel_grace_ms: 2000,
            clean_env: false,
        }
    }
}

impl RunnerSection {
    /// Timeout, or `None` when disabled.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Cancellation grace period.
    #[must_use]
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["quiver_registry=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_dirs() {
        let section = RegistrySection {
            script_dirs: vec![
                "~/.quiver/scripts".into(),
                "tools".into(),
                "/opt/scripts".into(),
            ],
            ..RegistrySection::default()
        };
        let dirs = section.resolve_dirs(Some(Path::new("/home/u")), Path::new("/work"));
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/home/u/.quiver/scripts"),
                PathBuf::from("/work/tools"),
                PathBuf::from("/opt/scripts"),
            ]
        );
    }

    #[test]
    fn test_resolve_dirs_without_home_drops_tilde() {
        let section = RegistrySection::default();
        assert!(section.resolve_dirs(None, Path::new("/work")).is_empty());
    }

    #[test]
    fn test_runner_durations() {
        let mut runner = RunnerSection::default();
        assert_eq!(runner.timeout(), None);
        runner.timeout_secs = 5;
        assert_eq!(runner.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(runner.cancel_grace(), Duration::from_millis(2000));
    }
}
