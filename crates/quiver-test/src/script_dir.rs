//! Temporary script directories.

use std::path::{Path, PathBuf};

use quiver_core::ScriptPath;
use tempfile::TempDir;

/// A temporary directory of scripts, removed on drop.
///
/// The root is canonicalized so paths compare equal to [`ScriptPath`]s.
#[derive(Debug)]
pub struct ScriptDir {
    _dir: TempDir,
    root: PathBuf,
}

impl ScriptDir {
    /// Create an empty script directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let root = std::fs::canonicalize(dir.path()).expect("failed to canonicalize temp dir");
        Self { _dir: dir, root }
    }

    /// Add a script and return `self`.
    #[must_use]
    pub fn with_script(self, name: &str, source: &str) -> Self {
        self.write(name, source);
        self
    }

    /// Write (or overwrite) a script. `name` may contain subdirectories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, name: &str, source: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create script subdirectory");
        }
        std::fs::write(&path, source).expect("failed to write script");
        path
    }

    /// Delete a script.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be removed.
    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.root.join(name)).expect("failed to remove script");
    }

    /// The directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// The directory as an owned path, for configuration lists.
    #[must_use]
    pub fn path_buf(&self) -> PathBuf {
        self.root.clone()
    }

    /// The identity of a script in this directory.
    #[must_use]
    pub fn script_path(&self, name: &str) -> ScriptPath {
        ScriptPath::new(self.root.join(name))
    }
}

impl Default for ScriptDir {
    fn default() -> Self {
        Self::new()
    }
}
