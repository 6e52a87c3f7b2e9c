// FILE: crates/library/src/history.rs
//! Processing history
//!
//! A JSON file mapping source fingerprints to the book they became. Records
//! are keyed by fingerprint, so recording the same unit twice replaces the
//! earlier record instead of adding a second one.

use crate::cache::write_atomic;
use crate::error::{LibraryError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use shelfsort_core::{Fingerprint, HistoryRecord, LibraryKey};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const HISTORY_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    records: BTreeMap<Fingerprint, HistoryRecord>,
}

/// Persisted record of processed units
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    file: HistoryFile,
}

impl HistoryStore {
    /// Loads the store; a missing file is an empty history
    ///
    /// A file that exists but cannot be parsed is an error rather than an
    /// empty history, so it is never silently overwritten.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = match fs::read_to_string(&path) {
            Ok(body) => serde_json::from_str(&body).map_err(|e| LibraryError::History {
                path: path.clone(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history at {}, starting empty", path.display());
                HistoryFile {
                    version: HISTORY_VERSION,
                    records: BTreeMap::new(),
                }
            }
            Err(e) => {
                return Err(LibraryError::History {
                    path,
                    reason: e.to_string(),
                })
            }
        };
        Ok(Self { path, file })
    }

    /// An unsaved store, for callers that never persist
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            file: HistoryFile::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.file.records.contains_key(fingerprint)
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&HistoryRecord> {
        self.file.records.get(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.file.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Fingerprint, &HistoryRecord)> {
        self.file.records.iter()
    }

    /// First record that produced `key`
    pub fn find_by_key(&self, key: &LibraryKey) -> Option<(&Fingerprint, &HistoryRecord)> {
        self.file
            .records
            .iter()
            .find(|(_, record)| &record.library_key == key)
    }

    /// Fingerprints starting with `prefix`, for short ids typed by a user
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<Fingerprint> {
        if prefix.is_empty() {
            return Vec::new();
        }
        self.file
            .records
            .keys()
            .filter(|fp| fp.as_str().starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Inserts or replaces the record for `fingerprint`
    pub fn record(
        &mut self,
        fingerprint: Fingerprint,
        record: HistoryRecord,
    ) -> Option<HistoryRecord> {
        info!(
            "Recording {} -> {}",
            fingerprint.short(),
            record.library_key
        );
        self.file.records.insert(fingerprint, record)
    }

    pub fn remove(&mut self, fingerprint: &Fingerprint) -> Option<HistoryRecord> {
        self.file.records.remove(fingerprint)
    }

    /// Writes the store atomically
    pub fn save(&mut self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }
        self.file.version = HISTORY_VERSION;
        let body = serde_json::to_string_pretty(&self.file)?;
        write_atomic(&self.path, body.as_bytes()).map_err(|e| LibraryError::History {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}
