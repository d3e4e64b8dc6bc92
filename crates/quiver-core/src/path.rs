//! Normalized script identity.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Absolute, normalized path of a script file.
///
/// Two `ScriptPath`s compare equal when they name the same file, regardless
/// of how the caller spelled the path. Resolution prefers
/// [`std::fs::canonicalize`]. For files that no longer exist (a deletion
/// event, for example) the parent directory is canonicalized instead, and as
/// a last resort the path is cleaned up lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptPath(PathBuf);

impl ScriptPath {
    /// Normalize `path` into a script identity.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Ok(canonical) = std::fs::canonicalize(path) {
            return Self(canonical);
        }
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name())
            && let Ok(parent) = std::fs::canonicalize(if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            })
        {
            return Self(parent.join(name));
        }
        Self(lexical_normalize(path))
    }

    /// Borrow the underlying path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// File name (`report.py`) as UTF-8, if representable.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name().and_then(|n| n.to_str())
    }

    /// File stem (`report`) as UTF-8, if representable.
    #[must_use]
    pub fn stem(&self) -> Option<&str> {
        self.0.file_stem().and_then(|n| n.to_str())
    }

    /// Directory containing the script.
    #[must_use]
    pub fn parent(&self) -> Option<&Path> {
        self.0.parent()
    }

    /// Whether the script lives under `dir` (compared component-wise).
    #[must_use]
    pub fn is_within(&self, dir: &Path) -> bool {
        self.0.starts_with(dir)
    }

    /// Consume into the inner [`PathBuf`].
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl fmt::Display for ScriptPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for ScriptPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl From<&Path> for ScriptPath {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for ScriptPath {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                out.pop();
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
