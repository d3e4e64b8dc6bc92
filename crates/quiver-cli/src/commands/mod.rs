//! Subcommand implementations.

pub(crate) mod check;
pub(crate) mod config;
pub(crate) mod init;
pub(crate) mod list;
pub(crate) mod run;
pub(crate) mod show;
pub(crate) mod watch;

use std::path::{Path, PathBuf};

use quiver_config::Config;
use quiver_kernel::{ManagerConfig, ScriptManager};

use crate::theme::Theme;

/// A manager opened for one command.
pub(crate) struct Session {
    pub(crate) manager: ScriptManager,
    cwd: PathBuf,
}

impl Session {
    /// Build the manager from configuration and discover scripts.
    ///
    /// `dirs`, when non-empty, replaces the configured script directories.
    pub(crate) async fn open(config: &Config, dirs: &[PathBuf], cwd: &Path) -> anyhow::Result<Self> {
        let home = quiver_config::loader::home_directory().ok();
        let mut settings = ManagerConfig::from_config(config, home.as_deref(), cwd);
        if !dirs.is_empty() {
            settings.directories = dirs.iter().map(|d| cwd.join(d)).collect();
        }

        let (manager, report) = ScriptManager::open(settings).await;
        for (dir, reason) in &report.failed_directories {
            eprintln!(
                "{}",
                Theme::warning(&format!("Skipped {}: {reason}", dir.display()))
            );
        }
        for (file, reason) in &report.failed_files {
            eprintln!(
                "{}",
                Theme::warning(&format!("Could not read {}: {reason}", file.display()))
            );
        }

        Ok(Self {
            manager,
            cwd: cwd.to_path_buf(),
        })
    }

    /// Resolve a path given on the command line.
    pub(crate) fn resolve(&self, path: &Path) -> PathBuf {
        self.cwd.join(path)
    }
}
