//! Processing history domain models

use crate::types::{LibraryKey, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable hash of a unit's source path set
///
/// Paths are sorted and de-duplicated before hashing, so the order in which
/// a scan discovered them does not matter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut normalized: Vec<String> = paths
            .iter()
            .map(|p| {
                let s = p.as_ref().to_string_lossy();
                let trimmed = s.trim_end_matches(['/', '\\']);
                if trimmed.is_empty() {
                    s.into_owned()
                } else {
                    trimmed.to_string()
                }
            })
            .collect();
        normalized.sort();
        normalized.dedup();

        let mut hasher = blake3::Hasher::new();
        for path in &normalized {
            hasher.update(path.as_bytes());
            hasher.update(b"\n");
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    /// Wraps an already computed digest, e.g. one typed on the command line
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for display
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one successful normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub processed_at: Timestamp,
    pub library_key: LibraryKey,
    /// Title directory the unit was placed in
    pub destination: PathBuf,
    /// Original source paths
    pub sources: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_order_independent() {
        let a = Fingerprint::from_paths(&["/dl/b.mp3", "/dl/a.mp3"]);
        let b = Fingerprint::from_paths(&["/dl/a.mp3", "/dl/b.mp3"]);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_fingerprint_ignores_duplicates_and_trailing_separators() {
        let a = Fingerprint::from_paths(&["/dl/book/", "/dl/book"]);
        let b = Fingerprint::from_paths(&["/dl/book"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_differs_for_different_sets() {
        let a = Fingerprint::from_paths(&["/dl/a.mp3"]);
        let b = Fingerprint::from_paths(&["/dl/a.mp3", "/dl/b.mp3"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_short() {
        let fp = Fingerprint::from_paths(&["/x"]);
        assert_eq!(fp.short().len(), 12);
        assert_eq!(Fingerprint::from_hex("abc").short(), "abc");
    }
}
