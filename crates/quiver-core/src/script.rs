//! The catalog record for one script.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CoreError, CoreResult};
use crate::metadata::{ScriptMetadata, humanize_stem, parse_metadata};
use crate::path::ScriptPath;
use crate::verdict::ValidationVerdict;

/// A discovered script with its declared metadata and cached verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntry {
    /// Normalized identity.
    pub path: ScriptPath,
    /// Display title.
    pub title: String,
    /// Declared description.
    pub description: String,
    /// Offered on the toolbar.
    pub toolbar: bool,
    /// Toolbar label, only when `toolbar` is set.
    pub toolbar_label: Option<String>,
    /// Author-declared reviewed marker.
    pub validated: bool,
    /// Last modification time of the file when it was read.
    pub modified: Option<DateTime<Utc>>,
    /// Source text as read from disk.
    pub source: String,
    /// Cached screening verdict. Reset whenever `source` changes.
    pub verdict: Option<ValidationVerdict>,
    /// Why the source could not be decoded, if it could not.
    pub parse_error: Option<String>,
}

impl ScriptEntry {
    /// Build an entry from already-decoded source text.
    #[must_use]
    pub fn from_source(path: ScriptPath, source: String, modified: Option<DateTime<Utc>>) -> Self {
        let meta = parse_metadata(path.as_path(), &source);
        Self::with_metadata(path, meta, source, modified, None)
    }

    /// Build a reduced entry for a file whose contents could not be decoded.
    #[must_use]
    pub fn undecodable(path: ScriptPath, error: String, modified: Option<DateTime<Utc>>) -> Self {
        let title = path
            .stem()
            .map_or_else(|| "Untitled".to_string(), humanize_stem);
        let meta = ScriptMetadata {
            title,
            description: String::new(),
            toolbar: false,
            toolbar_label: None,
            validated: false,
        };
        Self::with_metadata(path, meta, String::new(), modified, Some(error))
    }

    /// Read the script at `path` from disk.
    ///
    /// Files that are not valid UTF-8 still produce an entry, with
    /// [`parse_error`](Self::parse_error) set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Read`] if the file cannot be read at all.
    pub fn load(path: &ScriptPath) -> CoreResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| CoreError::Read {
            path: path.as_path().to_path_buf(),
            source,
        })?;
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        match String::from_utf8(bytes) {
            Ok(source) => Ok(Self::from_source(path.clone(), source, modified)),
            Err(e) => {
                let error = format!("source is not valid UTF-8: {}", e.utf8_error());
                warn!(path = %path, error = %error, "Script could not be decoded");
                Ok(Self::undecodable(path.clone(), error, modified))
            },
        }
    }

    /// Replace the source text, re-parsing metadata and clearing the verdict.
    pub fn replace_source(&mut self, source: String, modified: Option<DateTime<Utc>>) {
        *self = Self::from_source(self.path.clone(), source, modified);
    }

    /// The metadata fields as a standalone value.
    #[must_use]
    pub fn metadata(&self) -> ScriptMetadata {
        ScriptMetadata {
            title: self.title.clone(),
            description: self.description.clone(),
            toolbar: self.toolbar,
            toolbar_label: self.toolbar_label.clone(),
            validated: self.validated,
        }
    }

    fn with_metadata(
        path: ScriptPath,
        meta: ScriptMetadata,
        source: String,
        modified: Option<DateTime<Utc>>,
        parse_error: Option<String>,
    ) -> Self {
        Self {
            path,
            title: meta.title,
            description: meta.description,
            toolbar: meta.toolbar,
            toolbar_label: meta.toolbar_label,
            validated: meta.validated,
            modified,
            source,
            verdict: None,
            parse_error,
        }
    }
}
