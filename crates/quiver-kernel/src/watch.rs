//! Applying watcher events to the registry.

use std::sync::Arc;

use quiver_registry::{ScriptRegistry, WatchEvent, WatchResult};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Keeps the file watcher and its apply task running. Dropping it stops both.
#[derive(Debug)]
pub struct WatchHandle {
    watcher: JoinHandle<WatchResult<()>>,
    applier: JoinHandle<()>,
}

impl WatchHandle {
    pub(crate) fn spawn(
        watcher: quiver_registry::ScriptWatcher,
        mut events: mpsc::Receiver<WatchEvent>,
        registry: Arc<RwLock<ScriptRegistry>>,
    ) -> Self {
        let watcher = tokio::spawn(async move {
            let result = watcher.run().await;
            if let Err(e) = &result {
                error!(error = %e, "Script watcher stopped");
            }
            result
        });

        // Single consumer: events are applied one at a time, in order.
        let applier = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                apply(&registry, event).await;
            }
            debug!("Watch event channel closed, apply task stopping");
        });

        Self { watcher, applier }
    }

    /// Whether the watcher is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.watcher.is_finished()
    }

    /// Stop watching.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.watcher.abort();
        self.applier.abort();
    }
}

/// Apply one watcher event under the registry write lock.
pub(crate) async fn apply(registry: &RwLock<ScriptRegistry>, event: WatchEvent) {
    match event {
        WatchEvent::Created { path } | WatchEvent::Modified { path } => {
            if let Err(e) = registry.write().await.refresh(&path) {
                warn!(path = %path, error = %e, "Failed to reload changed script");
            }
        },
        WatchEvent::Removed { path } => {
            registry.write().await.remove(&path);
        },
        WatchEvent::DirectoryRemoved { dir } => {
            registry.write().await.remove_directory(&dir);
        },
        WatchEvent::Error(message) => {
            warn!(error = %message, "Script watcher reported an error");
        },
    }
}
