//! The script manager facade.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quiver_approval::SessionAcknowledgments;
use quiver_core::{GateDecision, ScriptEntry, ScriptPath, ValidationVerdict};
use quiver_registry::{
    DiscoveryReport, RegistryError, RegistryEvent, RegistryEventReceiver, RegistryEvents,
    ScriptRegistry, ScriptWatcher, ToolbarItem, WatchError, WatcherConfig,
};
use quiver_runner::ExecutionEngine;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::error::{KernelError, KernelResult};
use crate::example;
use crate::runs::{ActiveRuns, RunHandle};
use crate::settings::ManagerConfig;
use crate::subscription::SubscriptionHandle;
use crate::watch::WatchHandle;

/// Entry point for front ends.
///
/// Owns the catalog, the session acknowledgments and the execution engine.
/// All paths given to it are normalized, so any spelling of a script's path
/// refers to the same entry.
pub struct ScriptManager {
    config: ManagerConfig,
    registry: Arc<RwLock<ScriptRegistry>>,
    events: RegistryEvents,
    acks: Arc<SessionAcknowledgments>,
    engine: ExecutionEngine,
    active: ActiveRuns,
}

impl ScriptManager {
    /// Create a manager with an empty catalog.
    ///
    /// Call [`reload`](Self::reload) to discover scripts.
    #[must_use]
    pub fn new(config: ManagerConfig) -> Self {
        let registry = ScriptRegistry::new(config.discovery.clone());
        let events = registry.events().clone();
        Self {
            engine: ExecutionEngine::new(config.engine.clone()),
            config,
            registry: Arc::new(RwLock::new(registry)),
            events,
            acks: Arc::new(SessionAcknowledgments::new()),
            active: ActiveRuns::default(),
        }
    }

    /// Create a manager and discover its scripts.
    pub async fn open(config: ManagerConfig) -> (Self, DiscoveryReport) {
        let manager = Self::new(config);
        let report = manager.reload().await;
        (manager, report)
    }

    /// Settings in use.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The execution engine.
    #[must_use]
    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// Session acknowledgments.
    #[must_use]
    pub fn acknowledgments(&self) -> &SessionAcknowledgments {
        &self.acks
    }

    /// Rediscover every configured directory.
    ///
    /// Cached verdicts are dropped; acknowledgments are kept.
    pub async fn reload(&self) -> DiscoveryReport {
        self.registry
            .write()
            .await
            .discover(&self.config.directories)
    }

    /// All scripts, sorted by title.
    pub async fn list_scripts(&self) -> Vec<ScriptEntry> {
        self.registry
            .read()
            .await
            .list()
            .into_iter()
            .cloned()
            .collect()
    }

    /// One script.
    pub async fn get_script(&self, path: impl AsRef<Path>) -> Option<ScriptEntry> {
        let path = ScriptPath::new(path);
        self.registry.read().await.get(&path).cloned()
    }

    /// Scripts offered on the toolbar.
    pub async fn toolbar_scripts(&self) -> Vec<ToolbarItem> {
        self.registry.read().await.toolbar_entries()
    }

    /// Directories in the catalog.
    pub async fn directories(&self) -> Vec<PathBuf> {
        self.registry.read().await.directories().to_vec()
    }

    /// Screen a script, using the cached verdict while the file is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Registry`] if the script is unknown or cannot
    /// be re-read.
    pub async fn validate(&self, path: impl AsRef<Path>) -> KernelResult<ValidationVerdict> {
        let path = ScriptPath::new(path);
        let mut registry = self.registry.write().await;
        registry.sync(&path)?;
        Ok(registry.validate(&path)?)
    }

    /// Ask the run gate whether a script may run now.
    ///
    /// The file is re-read first, so the decision covers its current text
    /// whether or not the watcher is running.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Registry`] if the script is unknown or cannot
    /// be re-read.
    pub async fn request_execution(&self, path: impl AsRef<Path>) -> KernelResult<GateDecision> {
        let path = ScriptPath::new(path);
        let mut registry = self.registry.write().await;
        registry.sync(&path)?;
        Ok(registry.request_execution(&path, &self.acks)?)
    }

    /// Record the user's consent to run a flagged script this session.
    pub fn acknowledge(&self, path: impl AsRef<Path>) {
        self.acks.acknowledge(&ScriptPath::new(path));
    }

    /// Whether a script has a run in progress.
    #[must_use]
    pub fn is_running(&self, path: impl AsRef<Path>) -> bool {
        self.active.is_running(&ScriptPath::new(path))
    }

    /// Start a script.
    ///
    /// The file is re-read and the run gate applied under one write lock:
    /// the script must be clean or acknowledged. The interpreter then runs
    /// the exact text that was screened.
    ///
    /// # Errors
    ///
    /// - [`KernelError::Registry`] if the script is unknown
    /// - [`KernelError::NotAllowed`] if the gate refuses it
    /// - [`KernelError::AlreadyRunning`] if it is running already
    pub async fn run(&self, path: impl AsRef<Path>) -> KernelResult<RunHandle> {
        let path = ScriptPath::new(path);

        let entry = {
            let mut registry = self.registry.write().await;
            registry.sync(&path)?;
            let decision = registry.request_execution(&path, &self.acks)?;
            if !decision.is_allowed() {
                info!(path = %path, "Run refused by gate");
                return Err(KernelError::NotAllowed { path, decision });
            }
            registry
                .get(&path)
                .cloned()
                .ok_or_else(|| RegistryError::NotFound(path.clone()))?
        };

        let slot = self
            .active
            .claim(&path)
            .ok_or_else(|| KernelError::AlreadyRunning(path.clone()))?;

        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let engine = self.engine.clone();

        info!(run_id = %id, path = %path, "Run started");
        let task = tokio::spawn(async move {
            let _slot = slot;
            engine.run(&entry, &tx, &token).await
        });

        Ok(RunHandle::new(id, path, rx, cancel, task))
    }

    /// Receive registry changes as a stream.
    #[must_use]
    pub fn subscribe(&self) -> RegistryEventReceiver {
        self.events.subscribe()
    }

    /// Call `callback` for every registry change until the handle is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn on_registry_changed<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        SubscriptionHandle::spawn(self.events.subscribe(), Arc::new(callback))
    }

    /// Watch the catalog's directories and apply changes as they happen.
    ///
    /// Scripts added or deleted since the last discovery are applied as soon
    /// as the watcher starts.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Watch`] if the watcher cannot be created or
    /// none of the directories exists.
    pub async fn start_watching(&self) -> KernelResult<WatchHandle> {
        let roots = self.directories().await;
        if !roots.iter().any(|dir| dir.is_dir()) {
            return Err(WatchError::NoWatchableDirectories.into());
        }

        let known = self
            .registry
            .read()
            .await
            .list()
            .into_iter()
            .map(|entry| entry.path.clone())
            .collect();
        let (watcher, events) = ScriptWatcher::new(WatcherConfig {
            roots,
            debounce: self.config.debounce,
            filter: self.config.discovery.clone(),
            known: Some(known),
        })?;
        Ok(WatchHandle::spawn(
            watcher,
            events,
            Arc::clone(&self.registry),
        ))
    }

    /// Write the example script into `dir` if it has no scripts.
    ///
    /// The new script is added to the catalog when `dir` is one of its
    /// directories. Returns the path written, if any.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Registry`] if the directory or file cannot be
    /// written.
    pub async fn ensure_example_script(&self, dir: impl AsRef<Path>) -> KernelResult<Option<PathBuf>> {
        let Some(written) = example::write_example(dir.as_ref(), &self.config.discovery)? else {
            return Ok(None);
        };
        self.registry
            .write()
            .await
            .refresh(&ScriptPath::new(&written))?;
        Ok(Some(written))
    }
}

impl fmt::Debug for ScriptManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptManager")
            .field("directories", &self.config.directories)
            .field("active_runs", &self.active)
            .field("acknowledgments", &self.acks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
