//! Seen-item ledger
//!
//! Durable set of article identifiers that have already been delivered.
//! The backing file is a JSON array of strings, rewritten atomically
//! (temp file + rename) after every insert.
//!
//! # Example
//!
//! ```no_run
//! use steamcast::storage::SeenLedger;
//! use std::path::Path;
//!
//! let mut ledger = SeenLedger::load(Path::new("data/seen_articles.json"));
//! if !ledger.is_seen("5127") {
//!     // deliver, then commit
//!     if let Err(e) = ledger.mark_seen("5127") {
//!         eprintln!("ledger not persisted: {e}");
//!     }
//! }
//! ```

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while persisting the ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Filesystem error
    #[error("Ledger I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Ledger serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistent set of delivered article ids
#[derive(Debug)]
pub struct SeenLedger {
    path: PathBuf,
    seen: BTreeSet<String>,
}

impl SeenLedger {
    /// Load the ledger at `path`
    ///
    /// A missing file starts empty. A corrupt or unreadable file also starts
    /// empty, with a warning: current items will be announced once more.
    pub fn load(path: &Path) -> Self {
        let seen = match Self::read(path) {
            Ok(Some(ids)) => {
                tracing::info!(path = %path.display(), count = ids.len(), "Ledger loaded");
                ids
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "No ledger file, starting empty");
                BTreeSet::new()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ledger unreadable, starting empty"
                );
                BTreeSet::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            seen,
        }
    }

    /// Create an empty in-memory ledger bound to `path` without reading it
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            seen: BTreeSet::new(),
        }
    }

    fn read(path: &Path) -> Result<Option<BTreeSet<String>>, LedgerError> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path).map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ids: Vec<String> = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(ids.into_iter().collect()))
    }

    /// Whether `id` was already delivered
    pub fn is_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Record `id` as delivered and persist
    ///
    /// The id is committed in memory before the write, so a persistence
    /// failure still suppresses duplicates for this process. Returns
    /// `Ok(false)` when the id was already present (no write happens).
    pub fn mark_seen(&mut self, id: &str) -> Result<bool, LedgerError> {
        if !self.seen.insert(id.to_string()) {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    /// Write the full set to disk atomically
    pub fn flush(&self) -> Result<(), LedgerError> {
        let io_err = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let file = File::create(&temp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.seen)?;
        writer.flush().map_err(io_err)?;
        writer
            .into_inner()
            .map_err(|e| io_err(e.into_error()))?
            .sync_all()
            .map_err(io_err)?;

        fs::rename(&temp_path, &self.path).map_err(io_err)?;

        tracing::debug!(path = %self.path.display(), count = self.seen.len(), "Ledger saved");
        Ok(())
    }

    /// Forget every id and persist the empty set
    pub fn reset(&mut self) -> Result<(), LedgerError> {
        self.seen.clear();
        self.flush()
    }

    /// Number of ids recorded
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no id is recorded
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Recorded ids in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.seen.iter().map(String::as_str)
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = SeenLedger::load(&dir.path().join("seen.json"));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");
        fs::write(&path, "{not json").unwrap();

        let ledger = SeenLedger::load(&path);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_mark_seen_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("seen.json");

        let mut ledger = SeenLedger::load(&path);
        assert!(ledger.mark_seen("42").unwrap());
        assert!(ledger.is_seen("42"));

        let reloaded = SeenLedger::load(&path);
        assert!(reloaded.is_seen("42"));
        assert_eq!(reloaded.len(), 1);

        let raw = fs::read_to_string(&path).unwrap();
        let ids: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(ids, vec!["42".to_string()]);
    }

    #[test]
    fn test_mark_seen_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut ledger = SeenLedger::load(&dir.path().join("seen.json"));

        assert!(ledger.mark_seen("a").unwrap());
        assert!(!ledger.mark_seen("a").unwrap());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_persistence_failure_keeps_id_in_memory() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("blocked");
        fs::create_dir_all(path.join("child")).unwrap();

        let mut ledger = SeenLedger::empty(&path);
        assert!(ledger.mark_seen("7").is_err());
        assert!(ledger.is_seen("7"));
    }

    #[test]
    fn test_reset_clears_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");
        let mut ledger = SeenLedger::load(&path);
        ledger.mark_seen("1").unwrap();
        ledger.reset().unwrap();

        assert!(SeenLedger::load(&path).is_empty());
    }
}
