// FILE: crates/library/src/cache.rs
//! Scan cache keyed by downloads root
//!
//! The cache only saves a walk. Its directory fingerprint covers the path and
//! modification time of every directory under the root plus the scan settings,
//! so adding, removing or renaming anything invalidates it. A missing or
//! unreadable cache file is treated as empty.

use crate::error::{LibraryError, Result};
use crate::scanner::{is_hidden_name, ScanReport};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use shelfsort_config::ScanConfig;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    fingerprint: String,
    report: ScanReport,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: BTreeMap<String, CacheEntry>,
}

/// On-disk cache of scan reports
#[derive(Debug)]
pub struct ScanCache {
    path: PathBuf,
    file: CacheFile,
}

impl ScanCache {
    /// Loads the cache; problems reading it yield an empty cache
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = match fs::read_to_string(&path) {
            Ok(body) => match serde_json::from_str::<CacheFile>(&body) {
                Ok(file) if file.version == CACHE_VERSION => file,
                Ok(_) => {
                    debug!("Discarding scan cache with old version");
                    CacheFile::default()
                }
                Err(e) => {
                    warn!("Ignoring unreadable scan cache {}: {}", path.display(), e);
                    CacheFile::default()
                }
            },
            Err(_) => CacheFile::default(),
        };
        Self { path, file }
    }

    /// Cached report for `root` if its fingerprint still matches
    pub fn get(&self, root: &Path, fingerprint: &str) -> Option<&ScanReport> {
        let entry = self.file.entries.get(&root_key(root))?;
        if entry.fingerprint == fingerprint {
            debug!("Scan cache hit for {}", root.display());
            Some(&entry.report)
        } else {
            debug!("Scan cache stale for {}", root.display());
            None
        }
    }

    pub fn insert(&mut self, root: &Path, fingerprint: String, report: ScanReport) {
        self.file
            .entries
            .insert(root_key(root), CacheEntry { fingerprint, report });
    }

    /// Drops every entry
    pub fn clear(&mut self) {
        self.file.entries.clear();
    }

    /// Writes the cache atomically
    pub fn save(&mut self) -> Result<()> {
        self.file.version = CACHE_VERSION;
        let body = serde_json::to_string(&self.file)?;
        write_atomic(&self.path, body.as_bytes())
    }
}

/// Fingerprint of the directory structure under `root` and the scan settings
pub fn directory_fingerprint(
    root: &Path,
    config: &ScanConfig,
    grouping_threshold: f64,
) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(serde_json::to_string(config)?.as_bytes());
    hasher.update(&grouping_threshold.to_le_bytes());

    let walker = WalkDir::new(root)
        .follow_links(config.follow_symlinks)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(config.skip_hidden && is_hidden_name(&e.file_name().to_string_lossy()))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // The scanner reports this entry as a warning; hash it so a
                // repaired entry invalidates the cache.
                debug!("Fingerprint skipped unreadable entry: {}", e);
                if let Some(path) = e.path() {
                    hasher.update(b"!");
                    hasher.update(path.to_string_lossy().as_bytes());
                    hasher.update(b"\n");
                }
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        hasher.update(entry.path().to_string_lossy().as_bytes());
        hasher.update(b"\t");
        hasher.update(&modified.to_le_bytes());
        hasher.update(b"\n");
    }

    Ok(hasher.finalize().to_hex().to_string())
}

fn root_key(root: &Path) -> String {
    root.to_string_lossy().into_owned()
}

/// Writes `bytes` to `path` through a temporary file in the same directory
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut temp = NamedTempFile::new_in(&dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.persist(path).map_err(|e| LibraryError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::DownloadsScanner;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"audio").unwrap();
    }

    #[test]
    fn test_roundtrip_and_hit() {
        let downloads = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        touch(&downloads.path().join("Book/01.mp3"));

        let config = ScanConfig::default();
        let fingerprint = directory_fingerprint(downloads.path(), &config, 0.8).unwrap();
        let report = DownloadsScanner::new(config.clone(), 0.8)
            .scan(downloads.path())
            .unwrap();

        let cache_path = state.path().join("scan-cache.json");
        let mut cache = ScanCache::load(&cache_path);
        cache.insert(downloads.path(), fingerprint.clone(), report.clone());
        cache.save().unwrap();

        let reloaded = ScanCache::load(&cache_path);
        assert_eq!(reloaded.get(downloads.path(), &fingerprint), Some(&report));
    }

    #[test]
    fn test_new_folder_changes_fingerprint() {
        let downloads = TempDir::new().unwrap();
        touch(&downloads.path().join("Book/01.mp3"));
        let config = ScanConfig::default();

        let before = directory_fingerprint(downloads.path(), &config, 0.8).unwrap();
        assert_eq!(
            before,
            directory_fingerprint(downloads.path(), &config, 0.8).unwrap()
        );

        touch(&downloads.path().join("Another/01.mp3"));
        let after = directory_fingerprint(downloads.path(), &config, 0.8).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_settings_change_fingerprint() {
        let downloads = TempDir::new().unwrap();
        let config = ScanConfig::default();
        let a = directory_fingerprint(downloads.path(), &config, 0.8).unwrap();
        let b = directory_fingerprint(downloads.path(), &config, 0.7).unwrap();
        assert_ne!(a, b);
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_does_not_fail_fingerprint() {
        let downloads = TempDir::new().unwrap();
        touch(&downloads.path().join("Book/01.mp3"));
        std::os::unix::fs::symlink(
            downloads.path().join("gone"),
            downloads.path().join("dangling"),
        )
        .unwrap();

        let config = ScanConfig {
            follow_symlinks: true,
            ..ScanConfig::default()
        };
        let first = directory_fingerprint(downloads.path(), &config, 0.8).unwrap();
        assert_eq!(
            first,
            directory_fingerprint(downloads.path(), &config, 0.8).unwrap()
        );
    }

    #[test]
    fn test_corrupt_cache_is_empty() {
        let state = TempDir::new().unwrap();
        let cache_path = state.path().join("scan-cache.json");
        fs::write(&cache_path, "{{{{").unwrap();

        let cache = ScanCache::load(&cache_path);
        assert!(cache.get(Path::new("/any"), "fp").is_none());
    }
}
