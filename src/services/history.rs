//! Durable local cache of completed analysis results.
//!
//! The store is a set keyed by result id with most-recently-added-first
//! ordering. It is persisted to a JSON file after every successful insert;
//! a missing or corrupt file at startup resets to an empty history and is
//! never surfaced to the caller.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::models::result::AnalysisResult;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed history of analysis results, head = most recent.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Mutex<Vec<AnalysisResult>>,
}

impl HistoryStore {
    /// Load persisted history from `path`.
    ///
    /// Any load failure (absent file, unreadable payload, malformed JSON)
    /// initializes an empty history; the error is logged and swallowed.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = %path.display(), error = %e, "discarding unreadable history, starting empty");
                } else {
                    tracing::debug!(path = %path.display(), "no persisted history, starting empty");
                }
                Vec::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn read_entries(path: &Path) -> Result<Vec<AnalysisResult>, PersistenceError> {
        let payload = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&payload)?)
    }

    /// Idempotent upsert keyed by `result.id`.
    ///
    /// A new id is inserted at the head and persisted; re-adding an existing
    /// id changes neither content nor position. Returns whether the entry
    /// was newly inserted.
    pub fn add(&self, result: AnalysisResult) -> bool {
        let mut entries = self.entries.lock().unwrap();
        if entries.iter().any(|e| e.id == result.id) {
            tracing::debug!(result_id = %result.id, "history entry already present, skipping");
            return false;
        }
        entries.insert(0, result);
        // Persistence failures keep the in-memory state and are not surfaced.
        if let Err(e) = self.persist(&entries) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to persist history");
        }
        true
    }

    /// Full ordered history, head = most recently added.
    pub fn list(&self) -> Vec<AnalysisResult> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the full history atomically: temp file in the target directory,
    /// then rename over the destination.
    fn persist(&self, entries: &[AnalysisResult]) -> Result<(), PersistenceError> {
        let payload = serde_json::to_string_pretty(entries)?;
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new_in(".")?,
        };
        tmp.write_all(payload.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| PersistenceError::Io(e.error))?;
        Ok(())
    }
}
