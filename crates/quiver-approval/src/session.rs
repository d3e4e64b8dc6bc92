//! In-memory record of scripts acknowledged during this session.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use quiver_core::ScriptPath;

/// Scripts the user has explicitly agreed to run despite findings.
///
/// Thread-safe via internal [`RwLock`]. Entries are only added by
/// [`acknowledge`](Self::acknowledge) and never expire; [`clear`](Self::clear)
/// starts a fresh session.
///
/// # Example
///
/// ```
/// use quiver_approval::SessionAcknowledgments;
/// use quiver_core::ScriptPath;
///
/// let acks = SessionAcknowledgments::new();
/// let path = ScriptPath::new("/scripts/a.py");
/// assert!(!acks.is_acknowledged(&path));
/// acks.acknowledge(&path);
/// assert!(acks.is_acknowledged(&path));
/// ```
pub struct SessionAcknowledgments {
    acknowledged: RwLock<HashMap<ScriptPath, DateTime<Utc>>>,
}

impl SessionAcknowledgments {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            acknowledged: RwLock::new(HashMap::new()),
        }
    }

    /// Whether `path` was acknowledged this session.
    #[must_use]
    pub fn is_acknowledged(&self, path: &ScriptPath) -> bool {
        let store = self.acknowledged.read().unwrap_or_else(|e| {
            tracing::warn!("SessionAcknowledgments read lock poisoned, recovering");
            e.into_inner()
        });
        store.contains_key(path)
    }

    /// Record an acknowledgment for `path`.
    ///
    /// Idempotent; the first acknowledgment time is kept.
    pub fn acknowledge(&self, path: &ScriptPath) {
        let mut store = self.acknowledged.write().unwrap_or_else(|e| {
            tracing::warn!("SessionAcknowledgments lock poisoned, recovering");
            e.into_inner()
        });
        store.entry(path.clone()).or_insert_with(|| {
            tracing::info!(path = %path, "Script acknowledged for this session");
            Utc::now()
        });
    }

    /// When `path` was acknowledged, if it was.
    #[must_use]
    pub fn acknowledged_at(&self, path: &ScriptPath) -> Option<DateTime<Utc>> {
        self.acknowledged
            .read()
            .map(|s| s.get(path).copied())
            .unwrap_or_default()
    }

    /// Forget every acknowledgment.
    pub fn clear(&self) {
        if let Ok(mut store) = self.acknowledged.write() {
            store.clear();
        }
    }

    /// Number of acknowledged scripts.
    #[must_use]
    pub fn count(&self) -> usize {
        self.acknowledged.read().map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for SessionAcknowledgments {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionAcknowledgments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.count();
        f.debug_struct("SessionAcknowledgments")
            .field("count", &count)
            .finish()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
