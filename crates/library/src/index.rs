// FILE: crates/library/src/index.rs
//! Library index
//!
//! Walks `root/Author/Series/Title/` and `root/Author/Title/`. An
//! author-level child that holds audio files directly is a title with an
//! empty series; otherwise each of its subdirectories holding audio is a
//! title in that series. Subdirectories of a title that carry their own
//! `metadata.json` are separate books in a series named after that title.
//! Keys come from the directory names, the same way the
//! normalizer derives the key of a book it placed.

use crate::error::Result;
use crate::scanner::{is_hidden_name, ScanWarning};
use log::{debug, info};
use shelfsort_config::ScanConfig;
use shelfsort_content_sources::SIDECAR_FILE_NAME;
use shelfsort_core::{AudioFormat, LibraryEntry, LibraryKey, Metadata};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Existing books keyed by normalized `author/series/title`
#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    root: PathBuf,
    entries: BTreeMap<LibraryKey, LibraryEntry>,
    warnings: Vec<ScanWarning>,
}

impl LibraryIndex {
    /// Builds the index; a missing root is an empty library
    pub fn build(root: &Path, config: &ScanConfig) -> Result<Self> {
        let mut index = Self {
            root: root.to_path_buf(),
            ..Default::default()
        };

        if !root.exists() {
            debug!("Library root {} does not exist yet", root.display());
            return Ok(index);
        }

        for author_dir in index.subdirs(root, config) {
            let author = dir_name(&author_dir);
            for child in index.subdirs(&author_dir, config) {
                let series = dir_name(&child);
                if has_direct_audio(&child, config) {
                    // A titled folder can also be the series folder of books
                    // placed later; those always carry a metadata.json.
                    let nested: Vec<PathBuf> = index
                        .subdirs(&child, config)
                        .into_iter()
                        .filter(|d| d.join(SIDECAR_FILE_NAME).is_file())
                        .filter(|d| has_direct_audio(d, config))
                        .collect();
                    index.add(&author, "", &child, &nested, config);
                    for title_dir in &nested {
                        index.add(&author, &series, title_dir, &[], config);
                    }
                    continue;
                }
                for title_dir in index.subdirs(&child, config) {
                    if has_direct_audio(&title_dir, config) {
                        index.add(&author, &series, &title_dir, &[], config);
                    }
                }
            }
        }

        info!(
            "Indexed {} books under {}",
            index.entries.len(),
            root.display()
        );
        Ok(index)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, key: &LibraryKey) -> Option<&LibraryEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &LibraryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LibraryEntry> {
        self.entries.values()
    }

    /// Directories that could not be read while indexing
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Most similar entry by normalized key; earlier keys win ties
    pub fn best_match(&self, key: &LibraryKey) -> Option<(&LibraryEntry, f64)> {
        let mut best: Option<(&LibraryEntry, f64)> = None;
        for (candidate, entry) in &self.entries {
            let score = strsim::normalized_levenshtein(key.as_str(), candidate.as_str());
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((entry, score)),
            }
        }
        best
    }

    /// Indexes one title; files under `nested` belong to other books
    fn add(
        &mut self,
        author: &str,
        series: &str,
        title_dir: &Path,
        nested: &[PathBuf],
        config: &ScanConfig,
    ) {
        let mut entry = LibraryEntry::new(
            author.to_string(),
            series.to_string(),
            dir_name(title_dir),
            title_dir.to_path_buf(),
        );

        for file in WalkDir::new(title_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !nested.iter().any(|n| n == e.path()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if let Some(format) = audio_format(file.path(), config) {
                entry.formats.insert(format);
                entry.files.push(file.into_path());
            }
        }

        entry.metadata = read_sidecar(title_dir);
        debug!("Indexed {} at {}", entry.key, title_dir.display());

        if let Some(previous) = self.entries.insert(entry.key.clone(), entry) {
            debug!(
                "Key collision in library, keeping {}",
                previous.path.display()
            );
        }
    }

    fn subdirs(&mut self, dir: &Path, config: &ScanConfig) -> Vec<PathBuf> {
        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                self.warnings.push(ScanWarning::new(dir, e));
                return Vec::new();
            }
        };

        let mut dirs: Vec<PathBuf> = read_dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .filter(|p| !(config.skip_hidden && is_hidden_name(&dir_name(p))))
            .collect();
        dirs.sort();
        dirs
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn audio_format(path: &Path, config: &ScanConfig) -> Option<AudioFormat> {
    let ext = path.extension()?.to_str()?;
    if config.is_supported_extension(ext) {
        AudioFormat::from_extension(ext)
    } else {
        None
    }
}

fn has_direct_audio(dir: &Path, config: &ScanConfig) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .any(|e| e.path().is_file() && audio_format(&e.path(), config).is_some())
        })
        .unwrap_or(false)
}

/// `metadata.json` hint; unreadable or malformed files are ignored
fn read_sidecar(title_dir: &Path) -> Option<Metadata> {
    let body = fs::read_to_string(title_dir.join(SIDECAR_FILE_NAME)).ok()?;
    match serde_json::from_str(&body) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            debug!("Ignoring sidecar in {}: {}", title_dir.display(), e);
            None
        }
    }
}
