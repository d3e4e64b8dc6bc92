//! Script discovery in configured directories.
//!
//! A script is a regular file with one of the configured extensions whose
//! name does not start with `__` (so `__init__.py` and friends are skipped).
//! Subdirectories are only entered when recursion is enabled, and never when
//! they are caches, virtual environments or VCS metadata.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{RegistryError, RegistryResult};

/// Directory names never entered during a recursive scan.
pub const IGNORED_DIRS: &[&str] = &["__pycache__", ".git", ".venv", "venv", "node_modules"];

/// Which files count as scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Accepted extensions, without the leading dot.
    pub extensions: Vec<String>,
    /// Scan subdirectories.
    pub recursive: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["py".to_string()],
            recursive: false,
        }
    }
}

impl DiscoveryOptions {
    /// Whether `path` names a script by its file name alone.
    #[must_use]
    pub fn is_script_name(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.starts_with("__") {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }

    /// Whether `path` is a script file belonging to `root`.
    ///
    /// Without recursion only direct children of `root` belong to it.
    #[must_use]
    pub fn belongs_to(&self, path: &Path, root: &Path) -> bool {
        if !self.is_script_name(path) {
            return false;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            return false;
        };
        let mut dirs = rel.parent().into_iter().flat_map(Path::components);
        if self.recursive {
            !dirs.any(|c| {
                c.as_os_str()
                    .to_str()
                    .is_some_and(|s| IGNORED_DIRS.contains(&s))
            })
        } else {
            dirs.next().is_none()
        }
    }
}

/// List the scripts in `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`RegistryError::Discovery`] if `dir` itself cannot be read.
/// Unreadable entries below it are skipped.
pub fn find_scripts(dir: &Path, options: &DiscoveryOptions) -> RegistryResult<Vec<PathBuf>> {
    std::fs::read_dir(dir).map_err(|e| RegistryError::Discovery {
        dir: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && e.file_name()
                    .to_str()
                    .is_some_and(|n| IGNORED_DIRS.contains(&n)))
        });

    let mut scripts = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                continue;
            },
        };
        if entry.file_type().is_file() && options.is_script_name(entry.path()) {
            scripts.push(entry.into_path());
        }
    }
    scripts.sort();
    Ok(scripts)
}
