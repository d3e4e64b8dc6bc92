//! Hot-reload file watcher for script directories.
//!
//! # Architecture
//!
//! ```text
//! filesystem events (notify)
//!   → keep script files in watched roots (and the roots themselves)
//!   → debounce per path
//!   → classify by existence + blake3 content hash
//!   → emit WatchEvent
//! ```
//!
//! A `Modified` event is only emitted when the file's content hash changed,
//! so editors that rewrite a file unchanged do not trigger a reload.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use quiver_core::ScriptPath;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::discovery::{DiscoveryOptions, find_scripts};
use crate::error::{WatchError, WatchResult};

/// Default debounce interval for file change events.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Events emitted by the script watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A script file appeared.
    Created {
        /// The new file.
        path: ScriptPath,
    },
    /// A script file's content changed.
    Modified {
        /// The changed file.
        path: ScriptPath,
    },
    /// A script file disappeared.
    Removed {
        /// The removed file.
        path: ScriptPath,
    },
    /// A watched root directory disappeared.
    DirectoryRemoved {
        /// The removed root.
        dir: PathBuf,
    },
    /// Non-fatal watcher error.
    Error(String),
}

/// Configuration for the script watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Script directories to watch.
    pub roots: Vec<PathBuf>,
    /// Changes to one path within this window are coalesced.
    pub debounce: Duration,
    /// Which files count as scripts.
    pub filter: DiscoveryOptions,
    /// Scripts the consumer already holds. When set, files found at startup
    /// outside this set are reported as `Created` and members no longer on
    /// disk as `Removed`.
    pub known: Option<HashSet<ScriptPath>>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            debounce: DEFAULT_DEBOUNCE,
            filter: DiscoveryOptions::default(),
            known: None,
        }
    }
}

/// Watches script directories and emits [`WatchEvent`]s.
pub struct ScriptWatcher {
    config: WatcherConfig,
    /// Roots currently being watched, normalized.
    roots: Vec<PathBuf>,
    /// blake3 hash per known script file.
    hash_cache: HashMap<PathBuf, String>,
    /// Dropping this stops filesystem monitoring.
    watcher: RecommendedWatcher,
    raw_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    event_tx: mpsc::Sender<WatchEvent>,
}

impl ScriptWatcher {
    /// Create a watcher.
    ///
    /// Returns the watcher and a receiver for its events. Call
    /// [`run()`](Self::run) to start it.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Init`] if the platform watcher cannot be created.
    pub fn new(config: WatcherConfig) -> WatchResult<(Self, mpsc::Receiver<WatchEvent>)> {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(64);

        let watcher = RecommendedWatcher::new(
            move |res| {
                let _ = raw_tx.send(res);
            },
            notify::Config::default(),
        )
        .map_err(|e| WatchError::Init(e.to_string()))?;

        Ok((
            Self {
                config,
                roots: Vec::new(),
                hash_cache: HashMap::new(),
                watcher,
                raw_rx,
                event_tx,
            },
            event_rx,
        ))
    }

    /// Run the watcher until the event receiver is dropped.
    ///
    /// Roots that do not exist or cannot be watched are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::NoWatchableDirectories`] if no root could be
    /// watched at all.
    pub async fn run(mut self) -> WatchResult<()> {
        let mode = if self.config.filter.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        for root in &self.config.roots {
            let root = ScriptPath::new(root).into_path_buf();
            if !root.is_dir() {
                warn!(path = %root.display(), "Script directory does not exist, skipping");
                continue;
            }
            match self.watcher.watch(&root, mode) {
                Ok(()) => {
                    info!(path = %root.display(), "Watching script directory");
                    self.roots.push(root);
                },
                Err(e) => warn!(
                    path = %root.display(),
                    error = %e,
                    "Failed to watch directory"
                ),
            }
        }

        if self.roots.is_empty() {
            return Err(WatchError::NoWatchableDirectories);
        }

        self.seed_hashes().await;
        if !self.reconcile_known().await {
            return Ok(());
        }

        let debounce = self.config.debounce;
        let mut pending: HashMap<PathBuf, tokio::time::Instant> = HashMap::new();

        loop {
            let next_deadline = pending.values().copied().min();

            tokio::select! {
                biased;

                () = async {
                    match next_deadline {
                        Some(deadline) => tokio::time::sleep_until(deadline).await,
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    let now = tokio::time::Instant::now();
                    let mut ready: Vec<PathBuf> = pending
                        .iter()
                        .filter(|(_, deadline)| **deadline <= now)
                        .map(|(path, _)| path.clone())
                        .collect();
                    ready.sort();

                    for path in ready {
                        pending.remove(&path);
                        if !self.fire(&path).await {
                            return Ok(());
                        }
                    }
                }

                event = self.raw_rx.recv() => {
                    match event {
                        Some(Ok(ev)) => self.handle_raw_event(&ev, &mut pending, debounce),
                        Some(Err(e)) => {
                            warn!(error = %e, "Filesystem watcher error");
                            if !self.emit(WatchEvent::Error(e.to_string())).await {
                                return Ok(());
                            }
                        }
                        None => {
                            debug!("Filesystem watcher channel closed, stopping");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Record the hashes of scripts already present.
    async fn seed_hashes(&mut self) {
        let roots = self.roots.clone();
        let filter = self.config.filter.clone();
        let seeded = tokio::task::spawn_blocking(move || {
            let mut hashes = Vec::new();
            for root in &roots {
                let Ok(files) = find_scripts(root, &filter) else {
                    continue;
                };
                for file in files {
                    if let Ok(Some(hash)) = hash_file(&file) {
                        hashes.push((file, hash));
                    }
                }
            }
            hashes
        })
        .await;

        match seeded {
            Ok(hashes) => {
                debug!(files = hashes.len(), "Seeded script hashes");
                self.hash_cache.extend(hashes);
            },
            Err(e) => warn!(error = %e, "Hash seeding task failed"),
        }
    }

    /// Report differences between the seeded files and the consumer's view.
    ///
    /// Returns `false` once the event receiver is gone.
    async fn reconcile_known(&mut self) -> bool {
        let Some(known) = self.config.known.take() else {
            return true;
        };

        let seeded: HashSet<ScriptPath> = self.hash_cache.keys().map(ScriptPath::new).collect();
        let mut created: Vec<&ScriptPath> = seeded.difference(&known).collect();
        let mut removed: Vec<&ScriptPath> = known
            .difference(&seeded)
            .filter(|path| self.is_watched_script(path.as_path()))
            .collect();
        created.sort();
        removed.sort();

        if !created.is_empty() || !removed.is_empty() {
            info!(
                created = created.len(),
                removed = removed.len(),
                "Scripts changed before watching started"
            );
        }

        let events: Vec<WatchEvent> = created
            .into_iter()
            .map(|path| WatchEvent::Created { path: path.clone() })
            .chain(
                removed
                    .into_iter()
                    .map(|path| WatchEvent::Removed { path: path.clone() }),
            )
            .collect();
        for event in events {
            if !self.emit(event).await {
                return false;
            }
        }
        true
    }

    /// Queue the paths of a raw event for a debounced check.
    fn handle_raw_event(
        &self,
        event: &Event,
        pending: &mut HashMap<PathBuf, tokio::time::Instant>,
        debounce: Duration,
    ) {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {},
            _ => return,
        }

        for path in &event.paths {
            if !self.is_root(path) && !self.is_watched_script(path) {
                continue;
            }
            debug!(path = %path.display(), kind = ?event.kind, "Script change detected");
            #[allow(clippy::arithmetic_side_effects)]
            // Instant + Duration cannot overflow in practice
            let deadline = tokio::time::Instant::now() + debounce;
            pending.insert(path.clone(), deadline);
        }
    }

    fn is_root(&self, path: &Path) -> bool {
        self.roots
            .iter()
            .any(|root| path.components().eq(root.components()))
    }

    fn is_watched_script(&self, path: &Path) -> bool {
        self.roots
            .iter()
            .any(|root| self.config.filter.belongs_to(path, root))
    }

    /// Classify a settled path and emit its event.
    ///
    /// Returns `false` once the event receiver is gone.
    async fn fire(&mut self, path: &Path) -> bool {
        if self.is_root(path) {
            if path.is_dir() {
                return true;
            }
            info!(dir = %path.display(), "Script directory removed");
            self.roots.retain(|root| !path.components().eq(root.components()));
            self.hash_cache.retain(|file, _| !file.starts_with(path));
            return self
                .emit(WatchEvent::DirectoryRemoved {
                    dir: path.to_path_buf(),
                })
                .await;
        }

        let file = path.to_path_buf();
        let hashed = match tokio::task::spawn_blocking(move || hash_file(&file)).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Hash task was cancelled");
                return true;
            },
        };

        let event = match hashed {
            Ok(Some(hash)) => match self.hash_cache.insert(path.to_path_buf(), hash.clone()) {
                None => WatchEvent::Created {
                    path: ScriptPath::new(path),
                },
                Some(previous) if previous == hash => {
                    debug!(path = %path.display(), "Content unchanged, skipping reload");
                    return true;
                },
                Some(_) => WatchEvent::Modified {
                    path: ScriptPath::new(path),
                },
            },
            Ok(None) => {
                self.hash_cache.remove(path);
                WatchEvent::Removed {
                    path: ScriptPath::new(path),
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read changed script");
                WatchEvent::Error(format!("failed to read {}: {e}", path.display()))
            },
        };

        debug!(event = ?event, "Emitting watch event");
        self.emit(event).await
    }

    async fn emit(&self, event: WatchEvent) -> bool {
        if self.event_tx.send(event).await.is_err() {
            debug!("Event receiver dropped, stopping watcher");
            return false;
        }
        true
    }
}

/// blake3 hash of a file's content, `None` if it is not a regular file.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn hash_file(path: &Path) -> std::io::Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    match std::fs::read(path) {
        Ok(content) => Ok(Some(blake3::hash(&content).to_hex().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
