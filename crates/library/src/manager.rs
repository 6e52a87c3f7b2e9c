// FILE: crates/library/src/manager.rs

use crate::cache::{directory_fingerprint, ScanCache};
use crate::classifier::{Classified, Classifier};
use crate::error::{LibraryError, Result};
use crate::history::HistoryStore;
use crate::index::LibraryIndex;
use crate::normalizer::{record_history, FileNormalizer, NormalizeReport};
use crate::scanner::{DownloadsScanner, ScanReport, ScanWarning};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use shelfsort_config::Config;
use shelfsort_content_sources::{MetadataResolver, ResolverQuery, SidecarSource};
use shelfsort_core::{AppError, BookUnit, Fingerprint, HistoryRecord, LibraryKey, Metadata, Origin};
use shelfsort_resilience::{CancelToken, ResilienceError, Timeout};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Classified units plus everything skipped on the way
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifyReport {
    pub units: Vec<Classified>,
    pub warnings: Vec<ScanWarning>,
    /// Whether the downloads walk came from the scan cache
    pub cached: bool,
}

/// Application state shared by every operation
///
/// Holds the configuration, the history store and the resolver. Scanning and
/// classification only read; placement is serialized per destination key.
pub struct LibraryManager {
    config: Config,
    cache_path: PathBuf,
    history: Mutex<HistoryStore>,
    resolver: Arc<dyn MetadataResolver>,
    destination_locks: Mutex<HashMap<LibraryKey, Arc<tokio::sync::Mutex<()>>>>,
    cancel: CancelToken,
}

impl LibraryManager {
    /// Creates the manager; relative state files resolve against `config_dir`
    pub fn new(config: Config, config_dir: &Path) -> Result<Self> {
        let history_path = resolve(config_dir, &config.library.history_file);
        let cache_path = resolve(config_dir, &config.library.cache_file);

        info!(
            "Initializing library manager (downloads: {}, library: {})",
            config.library.downloads_root.display(),
            config.library.library_root.display()
        );

        let history = HistoryStore::load(history_path)?;
        debug!("Loaded {} history records", history.len());

        Ok(Self {
            config,
            cache_path,
            history: Mutex::new(history),
            resolver: Arc::new(SidecarSource::new()),
            destination_locks: Mutex::new(HashMap::new()),
            cancel: CancelToken::new(),
        })
    }

    /// Replaces the metadata resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn MetadataResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Token that aborts pending resolver waits when cancelled
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Walks the downloads root, reusing the cached result when nothing changed
    ///
    /// Returns the report and whether it came from the cache.
    pub fn scan_downloads(&self, refresh: bool) -> Result<(ScanReport, bool)> {
        let root = &self.config.library.downloads_root;
        let threshold = self.config.matching.grouping_threshold;
        let fingerprint = directory_fingerprint(root, &self.config.scan, threshold)?;

        let mut cache = ScanCache::load(&self.cache_path);
        if refresh {
            debug!("Scan cache bypassed");
        } else if let Some(report) = cache.get(root, &fingerprint) {
            return Ok((report.clone(), true));
        }

        let scanner = DownloadsScanner::new(self.config.scan.clone(), threshold);
        let report = scanner.scan(root)?;

        cache.insert(root, fingerprint, report.clone());
        if let Err(e) = cache.save() {
            warn!("Could not save scan cache: {}", e);
        }
        Ok((report, false))
    }

    pub fn build_index(&self) -> Result<LibraryIndex> {
        LibraryIndex::build(&self.config.library.library_root, &self.config.scan)
    }

    /// Scans, indexes and classifies every downloaded unit
    pub fn classify(&self, refresh: bool) -> Result<ClassifyReport> {
        let (scan, cached) = self.scan_downloads(refresh)?;
        let index = self.build_index()?;

        let classifier = Classifier::new(self.config.matching.duplicate_threshold);
        let units = {
            let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            classifier.classify_all(&scan.units, &index, &history)
        };

        let mut warnings = scan.warnings;
        warnings.extend(index.warnings().iter().cloned());

        Ok(ClassifyReport {
            units,
            warnings,
            cached,
        })
    }

    /// Asks the resolver for metadata, bounded by the configured timeout
    ///
    /// No result, a resolver error and a timeout all leave the unit pending
    /// as [`LibraryError::MetadataUnavailable`].
    pub async fn resolve_metadata(&self, unit: &BookUnit) -> Result<Metadata> {
        let mut query = ResolverQuery::from_guess(&unit.title, &unit.author);
        if unit.origin != Origin::CollectionGrouped {
            query = query.with_folder(&unit.scope);
        }

        let subject = unit.display_name();
        if !self.resolver.is_available() {
            return Err(LibraryError::MetadataUnavailable {
                subject,
                reason: format!("resolver {} is unavailable", self.resolver.name()),
            });
        }

        let resolver = Arc::clone(&self.resolver);
        let timeout = Timeout::new(self.config.resolver.timeout());
        debug!("Resolving metadata for {} via {}", subject, resolver.name());

        let outcome = timeout
            .run_blocking(move || resolver.resolve(&query), &self.cancel)
            .await;

        let unavailable = |reason: String| LibraryError::MetadataUnavailable {
            subject: subject.clone(),
            reason,
        };

        match outcome {
            Ok(Ok(Some(metadata))) => Ok(metadata),
            Ok(Ok(None)) => Err(unavailable("no results".to_string())),
            Ok(Err(e)) => Err(unavailable(e.to_string())),
            Err(ResilienceError::Cancelled) => Err(AppError::Cancelled {
                operation: format!("metadata lookup for {}", subject),
            }
            .into()),
            Err(e) => Err(unavailable(e.to_string())),
        }
    }

    /// Places a confirmed unit and records it in history
    ///
    /// Placements resolving to the same destination key run one at a time;
    /// the normalizer's collision handling covers everything else.
    pub async fn process_selection(
        &self,
        unit: &BookUnit,
        metadata: Metadata,
        delete_sources: bool,
    ) -> Result<NormalizeReport> {
        let normalizer = FileNormalizer::new(
            self.config.library.library_root.clone(),
            self.config.library.transfer_mode,
        );

        let lock = self.destination_lock(normalizer.planned_key(&metadata));
        let _guard = lock.lock().await;

        let placed_unit = unit.clone();
        let report = tokio::task::spawn_blocking(move || {
            normalizer.place(&placed_unit, &metadata, delete_sources)
        })
        .await
        .map_err(|e| LibraryError::Io(std::io::Error::other(e.to_string())))??;

        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        record_history(&mut history, unit, &report)?;
        Ok(report)
    }

    /// History records sorted by processing time
    pub fn history_records(&self) -> Vec<(Fingerprint, HistoryRecord)> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records: Vec<_> = history
            .iter()
            .map(|(fp, record)| (fp.clone(), record.clone()))
            .collect();
        records.sort_by(|a, b| a.1.processed_at.cmp(&b.1.processed_at));
        records
    }

    /// Removes the record whose fingerprint starts with `prefix`
    pub fn forget(&self, prefix: &str) -> Result<(Fingerprint, HistoryRecord)> {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let fingerprint = single(history.find_by_prefix(prefix), prefix)?;
        let record = history
            .remove(&fingerprint)
            .ok_or_else(|| LibraryError::UnitNotFound(prefix.to_string()))?;
        history.save()?;
        info!("Forgot {} ({})", fingerprint.short(), record.library_key);
        Ok((fingerprint, record))
    }

    fn destination_lock(&self, key: LibraryKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .destination_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key).or_default())
    }
}

/// Picks a unit by fingerprint prefix or case-insensitive display name
pub fn find_unit<'a>(units: &'a [Classified], selector: &str) -> Result<&'a Classified> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(LibraryError::UnitNotFound(selector.to_string()));
    }

    let by_fingerprint: Vec<&Classified> = units
        .iter()
        .filter(|c| c.unit.fingerprint().as_str().starts_with(selector))
        .collect();
    let candidates = if by_fingerprint.is_empty() {
        units
            .iter()
            .filter(|c| c.unit.display_name().eq_ignore_ascii_case(selector))
            .collect()
    } else {
        by_fingerprint
    };

    single(candidates, selector)
}

fn single<T>(mut found: Vec<T>, selector: &str) -> Result<T> {
    match found.len() {
        0 => Err(LibraryError::UnitNotFound(selector.to_string())),
        1 => Ok(found.remove(0)),
        count => Err(LibraryError::AmbiguousUnit {
            selector: selector.to_string(),
            count,
        }),
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfsort_core::ClassificationStatus;

    fn classified(dir: &str) -> Classified {
        let unit = BookUnit::new(
            vec![PathBuf::from(format!("/dl/{}/01.mp3", dir))],
            PathBuf::from(format!("/dl/{}", dir)),
            Origin::FolderGrouped,
        )
        .unwrap()
        .with_guess("", "", dir, None);
        Classified {
            unit,
            status: ClassificationStatus::Untidy,
            matched: None,
        }
    }

    #[test]
    fn test_find_unit_by_name() {
        let units = vec![classified("Dune"), classified("Emma")];
        let found = find_unit(&units, "dune").unwrap();
        assert_eq!(found.unit.title, "Dune");
    }

    #[test]
    fn test_find_unit_by_fingerprint_prefix() {
        let units = vec![classified("Dune"), classified("Emma")];
        let fp = units[1].unit.fingerprint();
        let found = find_unit(&units, &fp.as_str()[..12]).unwrap();
        assert_eq!(found.unit.title, "Emma");
    }

    #[test]
    fn test_find_unit_errors() {
        let units = vec![classified("Dune"), classified("Dune")];
        assert!(matches!(
            find_unit(&units, "Dune"),
            Err(LibraryError::AmbiguousUnit { count: 2, .. })
        ));
        assert!(matches!(
            find_unit(&units, "Nope"),
            Err(LibraryError::UnitNotFound(_))
        ));
        assert!(matches!(
            find_unit(&units, ""),
            Err(LibraryError::UnitNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_relative_state_paths() {
        let base = Path::new("/cfg");
        assert_eq!(
            resolve(base, Path::new("history.json")),
            PathBuf::from("/cfg/history.json")
        );
        assert_eq!(
            resolve(base, Path::new("/var/h.json")),
            PathBuf::from("/var/h.json")
        );
    }
}
