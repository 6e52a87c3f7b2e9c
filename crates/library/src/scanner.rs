// FILE: crates/library/src/scanner.rs
//! Downloads scanner
//!
//! Direct subdirectories of the downloads root are authoritative book
//! boundaries. Loose files in the root, and everything under the collection
//! folder, go through the [`SimilarityGrouper`]. Unreadable entries become
//! warnings; only an unreadable root fails the scan.

use crate::error::{LibraryError, Result};
use crate::extract::{extract_guess, NameGuess};
use crate::grouper::SimilarityGrouper;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use shelfsort_config::ScanConfig;
use shelfsort_core::{AudioFormat, BookUnit, Origin};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Synology thumbnail/index folder
const SYNOLOGY_METADATA_DIR: &str = "@eaDir";

/// A path the scanner had to skip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl ScanWarning {
    pub fn new(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Scan output: units sorted by first path, plus skipped paths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub units: Vec<BookUnit>,
    pub warnings: Vec<ScanWarning>,
}

/// Walks a downloads root into candidate book units
#[derive(Debug, Clone)]
pub struct DownloadsScanner {
    config: ScanConfig,
    grouper: SimilarityGrouper,
}

impl DownloadsScanner {
    pub fn new(config: ScanConfig, grouping_threshold: f64) -> Self {
        Self {
            config,
            grouper: SimilarityGrouper::new(grouping_threshold),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scans `root` into book units
    pub fn scan(&self, root: &Path) -> Result<ScanReport> {
        info!("Scanning downloads root {}", root.display());

        let read_dir = fs::read_dir(root).map_err(|e| LibraryError::Scan {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut warnings = Vec::new();
        let mut entries = Vec::new();
        for entry in read_dir {
            match entry {
                Ok(entry) => entries.push(entry.path()),
                Err(e) => warnings.push(ScanWarning::new(root, e)),
            }
        }
        entries.sort();

        let mut folders = Vec::new();
        let mut loose = Vec::new();
        let mut collection = None;

        for path in entries {
            let name = file_name(&path);
            if self.is_skipped_name(&name) {
                debug!("Skipping hidden entry {}", path.display());
                continue;
            }

            let is_dir = match self.entry_is_dir(&path) {
                Ok(is_dir) => is_dir,
                Err(e) => {
                    warnings.push(ScanWarning::new(&path, e));
                    continue;
                }
            };

            if is_dir {
                if name == self.config.collection_folder {
                    collection = Some(path);
                } else {
                    folders.push(path);
                }
            } else if self.is_audio(&path) {
                loose.push(path);
            }
        }

        let folder_results: Vec<(Option<BookUnit>, Vec<ScanWarning>)> = folders
            .par_iter()
            .map(|folder| self.folder_unit(folder))
            .collect();

        let mut units = Vec::new();
        for (unit, folder_warnings) in folder_results {
            units.extend(unit);
            warnings.extend(folder_warnings);
        }

        units.extend(self.collection_units(root, loose, &mut warnings));

        if let Some(collection) = collection {
            let mut files = Vec::new();
            self.collect_audio(&collection, &mut files, &mut warnings);
            units.extend(self.collection_units(&collection, files, &mut warnings));
        }

        units.sort_by(|a, b| a.paths.first().cmp(&b.paths.first()));

        for warning in &warnings {
            warn!("Scan skipped {}", warning);
        }
        info!(
            "Scan found {} units ({} warnings)",
            units.len(),
            warnings.len()
        );

        Ok(ScanReport { units, warnings })
    }

    /// One unit from a direct subdirectory, or none if it holds no audio
    fn folder_unit(&self, folder: &Path) -> (Option<BookUnit>, Vec<ScanWarning>) {
        let mut warnings = Vec::new();
        let mut files = Vec::new();
        self.collect_audio(folder, &mut files, &mut warnings);

        if files.is_empty() {
            debug!("No audio in {}", folder.display());
            return (None, warnings);
        }

        let mut guess = extract_guess(&file_name(folder));
        if guess.title.is_empty() {
            guess = files
                .first()
                .map(|f| extract_guess(&file_name(f)))
                .unwrap_or_default();
        }

        match BookUnit::new(files, folder.to_path_buf(), Origin::FolderGrouped) {
            Ok(unit) => (Some(apply_guess(unit, guess)), warnings),
            Err(e) => {
                warnings.push(ScanWarning::new(folder, e));
                (None, warnings)
            }
        }
    }

    fn collection_units(
        &self,
        scope: &Path,
        files: Vec<PathBuf>,
        warnings: &mut Vec<ScanWarning>,
    ) -> Vec<BookUnit> {
        let mut units = Vec::new();

        for group in self.grouper.group(&files) {
            let mut guess = group
                .paths
                .first()
                .map(|f| extract_guess(&file_name(f)))
                .unwrap_or_default();
            // A trailing number on a multi-file group is the track, not the series part
            if group.paths.len() > 1 && guess.series.is_empty() {
                guess.series_part = None;
            }

            match BookUnit::new(group.paths, scope.to_path_buf(), Origin::CollectionGrouped) {
                Ok(mut unit) => {
                    unit.confidence = Some(group.confidence);
                    units.push(apply_guess(unit, guess));
                }
                Err(e) => warnings.push(ScanWarning::new(scope, e)),
            }
        }

        units
    }

    /// Recursively collects supported audio files under `dir`
    fn collect_audio(
        &self,
        dir: &Path,
        files: &mut Vec<PathBuf>,
        warnings: &mut Vec<ScanWarning>,
    ) {
        let walker = WalkDir::new(dir)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_skipped_entry(e));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| dir.to_path_buf());
                    warnings.push(ScanWarning::new(path, e));
                    continue;
                }
            };

            if entry.file_type().is_file() && self.is_audio(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    fn entry_is_dir(&self, path: &Path) -> std::io::Result<bool> {
        let metadata = if self.config.follow_symlinks {
            fs::metadata(path)?
        } else {
            fs::symlink_metadata(path)?
        };
        Ok(metadata.is_dir())
    }

    fn is_audio(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.config.is_supported_extension(ext)
                    && AudioFormat::from_extension(ext).is_some()
            })
    }

    fn is_skipped_entry(&self, entry: &DirEntry) -> bool {
        self.is_skipped_name(&entry.file_name().to_string_lossy())
    }

    fn is_skipped_name(&self, name: &str) -> bool {
        self.config.skip_hidden && is_hidden_name(name)
    }
}

/// Dot-files and NAS metadata folders
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.') || name == SYNOLOGY_METADATA_DIR
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn apply_guess(unit: BookUnit, guess: NameGuess) -> BookUnit {
    unit.with_guess(guess.author, guess.series, guess.title, guess.series_part)
}
