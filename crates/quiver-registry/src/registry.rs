//! The script catalog.
//!
//! Holds one [`ScriptEntry`] per normalized path. Verdicts are computed
//! lazily on first request and cached on the entry until its source changes.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use quiver_approval::{SessionAcknowledgments, decide};
use quiver_core::{GateDecision, ScriptEntry, ScriptPath, ValidationVerdict};
use quiver_screen::Validator;
use tracing::{debug, info, warn};

use crate::discovery::{DiscoveryOptions, find_scripts};
use crate::error::{RegistryError, RegistryResult};
use crate::events::{RegistryEvent, RegistryEvents};

/// Summary of a discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Directories that were scanned, normalized.
    pub directories: Vec<PathBuf>,
    /// Scripts registered.
    pub scripts: usize,
    /// Directories that could not be scanned, with the reason.
    pub failed_directories: Vec<(PathBuf, String)>,
    /// Files that could not be read, with the reason.
    pub failed_files: Vec<(PathBuf, String)>,
    /// Scripts registered with a decode error.
    pub undecodable: Vec<ScriptPath>,
}

impl DiscoveryReport {
    /// Whether every directory and file was read.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_directories.is_empty() && self.failed_files.is_empty()
    }
}

/// A script offered on the toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarItem {
    /// The script.
    pub path: ScriptPath,
    /// Label to show.
    pub label: String,
}

/// Catalog of discovered scripts.
pub struct ScriptRegistry {
    entries: HashMap<ScriptPath, ScriptEntry>,
    directories: Vec<PathBuf>,
    options: DiscoveryOptions,
    validator: Validator,
    events: RegistryEvents,
}

impl ScriptRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(options: DiscoveryOptions) -> Self {
        Self {
            entries: HashMap::new(),
            directories: Vec::new(),
            options,
            validator: Validator::default(),
            events: RegistryEvents::new(),
        }
    }

    /// Use a custom validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// The change notification bus.
    #[must_use]
    pub fn events(&self) -> &RegistryEvents {
        &self.events
    }

    /// Discovery settings.
    #[must_use]
    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    /// Rebuild the catalog from `directories`.
    ///
    /// Previous entries and their verdicts are dropped. Directories that
    /// cannot be scanned stay registered so a later reload can pick them up.
    pub fn discover(&mut self, directories: &[PathBuf]) -> DiscoveryReport {
        self.entries.clear();
        self.directories.clear();
        let mut report = DiscoveryReport::default();

        for dir in directories {
            let root = ScriptPath::new(dir).into_path_buf();
            if self.directories.contains(&root) {
                continue;
            }
            self.directories.push(root.clone());
            report.directories.push(root.clone());

            let files = match find_scripts(&root, &self.options) {
                Ok(files) => files,
                Err(e) => {
                    warn!(dir = %root.display(), error = %e, "Failed to scan script directory");
                    report.failed_directories.push((root, e.to_string()));
                    continue;
                },
            };

            for file in files {
                let path = ScriptPath::new(&file);
                match ScriptEntry::load(&path) {
                    Ok(entry) => {
                        if entry.parse_error.is_some() {
                            report.undecodable.push(path.clone());
                        }
                        if self.entries.insert(path.clone(), entry).is_some() {
                            debug!(path = %path, "Duplicate script after normalization, keeping latest");
                        }
                    },
                    Err(e) => {
                        warn!(path = %file.display(), error = %e, "Failed to read script");
                        report.failed_files.push((file, e.to_string()));
                    },
                }
            }
        }

        report.scripts = self.entries.len();
        info!(
            scripts = report.scripts,
            directories = report.directories.len(),
            "Discovered scripts"
        );
        self.events.publish(RegistryEvent::Reloaded {
            count: report.scripts,
        });
        report
    }

    /// Look up a script.
    #[must_use]
    pub fn get(&self, path: &ScriptPath) -> Option<&ScriptEntry> {
        self.entries.get(path)
    }

    /// Whether a script is registered.
    #[must_use]
    pub fn contains(&self, path: &ScriptPath) -> bool {
        self.entries.contains_key(path)
    }

    /// All scripts, sorted by lower-cased title then path.
    #[must_use]
    pub fn list(&self) -> Vec<&ScriptEntry> {
        let mut entries: Vec<&ScriptEntry> = self.entries.values().collect();
        entries.sort_by_cached_key(|e| (e.title.to_lowercase(), e.path.clone()));
        entries
    }

    /// Number of registered scripts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no scripts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The screening verdict for a script, computed on first request.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown paths.
    pub fn validate(&mut self, path: &ScriptPath) -> RegistryResult<ValidationVerdict> {
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| RegistryError::NotFound(path.clone()))?;

        if let Some(verdict) = &entry.verdict {
            return Ok(verdict.clone());
        }

        let verdict = match &entry.parse_error {
            Some(error) => ValidationVerdict::ParseFailed(error.clone()),
            None => self.validator.validate_str(&entry.source),
        };
        debug!(path = %path, verdict = %verdict, "Script screened");
        entry.verdict = Some(verdict.clone());
        Ok(verdict)
    }

    /// Decide whether a script may run now.
    ///
    /// Screens the script if needed, then applies the gate policy.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown paths.
    pub fn request_execution(
        &mut self,
        path: &ScriptPath,
        acks: &SessionAcknowledgments,
    ) -> RegistryResult<GateDecision> {
        let verdict = self.validate(path)?;
        let validated = self.entries.get(path).is_some_and(|e| e.validated);
        let decision = decide(&verdict, validated, acks.is_acknowledged(path));
        debug!(path = %path, allowed = decision.is_allowed(), "Execution requested");
        Ok(decision)
    }

    /// Re-read a script from disk.
    ///
    /// A file that no longer exists is removed. A new file is added if it
    /// belongs to a registered directory. Returns the event published, if
    /// any.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] if the file exists but cannot be read.
    pub fn refresh(&mut self, path: &ScriptPath) -> RegistryResult<Option<RegistryEvent>> {
        if !path.as_path().is_file() {
            return Ok(self
                .remove(path)
                .map(|entry| RegistryEvent::Removed { path: entry.path }));
        }
        if !self.contains(path) && !self.accepts(path.as_path()) {
            debug!(path = %path, "Ignoring file outside script directories");
            return Ok(None);
        }

        let entry = ScriptEntry::load(path)?;
        let event = if self.entries.insert(path.clone(), entry).is_some() {
            info!(path = %path, "Script reloaded");
            RegistryEvent::Updated { path: path.clone() }
        } else {
            info!(path = %path, "Script added");
            RegistryEvent::Added { path: path.clone() }
        };
        self.events.publish(event.clone());
        Ok(Some(event))
    }

    /// Bring a registered script in line with the file on disk.
    ///
    /// The entry is replaced, and its verdict dropped, only when the file's
    /// text differs from the cached source. A deleted file is removed.
    /// Unregistered paths are left alone. Returns the event published, if
    /// any.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] if the file exists but cannot be read.
    pub fn sync(&mut self, path: &ScriptPath) -> RegistryResult<Option<RegistryEvent>> {
        let Some(current) = self.entries.get(path) else {
            return Ok(None);
        };
        if !path.as_path().is_file() {
            return self.refresh(path);
        }

        let fresh = ScriptEntry::load(path)?;
        if fresh.source == current.source && fresh.parse_error == current.parse_error {
            return Ok(None);
        }

        debug!(path = %path, "Script changed on disk since last read");
        self.entries.insert(path.clone(), fresh);
        let event = RegistryEvent::Updated { path: path.clone() };
        self.events.publish(event.clone());
        Ok(Some(event))
    }

    /// Remove a script.
    pub fn remove(&mut self, path: &ScriptPath) -> Option<ScriptEntry> {
        let entry = self.entries.remove(path)?;
        info!(path = %path, "Script removed");
        self.events.publish(RegistryEvent::Removed { path: path.clone() });
        Some(entry)
    }

    /// Forget a directory and every script under it.
    ///
    /// Returns the removed scripts in path order.
    pub fn remove_directory(&mut self, dir: &Path) -> Vec<ScriptPath> {
        let dir = ScriptPath::new(dir).into_path_buf();
        self.directories.retain(|d| !d.starts_with(&dir));

        let mut removed: Vec<ScriptPath> = self
            .entries
            .keys()
            .filter(|p| p.is_within(&dir))
            .cloned()
            .collect();
        removed.sort();
        for path in &removed {
            self.remove(path);
        }
        info!(dir = %dir.display(), removed = removed.len(), "Script directory removed");
        removed
    }

    /// Scripts offered on the toolbar with their labels, in list order.
    #[must_use]
    pub fn toolbar_entries(&self) -> Vec<ToolbarItem> {
        self.list()
            .into_iter()
            .filter(|e| e.toolbar)
            .map(|e| ToolbarItem {
                path: e.path.clone(),
                label: e.toolbar_label.clone().unwrap_or_else(|| e.title.clone()),
            })
            .collect()
    }

    /// Registered directories, normalized, in registration order.
    #[must_use]
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Whether `path` would be discovered in one of the registered directories.
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        self.directories
            .iter()
            .any(|dir| self.options.belongs_to(path, dir))
    }
}

impl Default for ScriptRegistry {
    fn default() -> Self {
        Self::new(DiscoveryOptions::default())
    }
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("scripts", &self.entries.len())
            .field("directories", &self.directories)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
