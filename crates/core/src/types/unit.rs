//! Candidate book units

use crate::error::{AppError, Result};
use crate::types::{AudioFormat, Fingerprint, LibraryKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// How the files of a unit were put together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// One direct subdirectory of the downloads root
    FolderGrouped,
    /// Loose files clustered by filename similarity
    CollectionGrouped,
    /// Assembled by hand
    ManualBundle,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FolderGrouped => write!(f, "folder"),
            Self::CollectionGrouped => write!(f, "collection"),
            Self::ManualBundle => write!(f, "manual"),
        }
    }
}

/// A candidate book: one or more audio files believed to belong together
///
/// Units are rebuilt on every scan. The guess fields hold whatever the name
/// extraction could find and are empty strings otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookUnit {
    /// Source files, sorted by path
    pub paths: Vec<PathBuf>,
    /// Folder or collection root every path lives under
    pub scope: PathBuf,
    pub origin: Origin,
    pub title: String,
    pub author: String,
    pub series: String,
    pub series_part: Option<f32>,
    pub formats: BTreeSet<AudioFormat>,
    /// Grouper confidence for collection-grouped units
    pub confidence: Option<f64>,
}

impl BookUnit {
    /// Creates a unit, enforcing a non-empty file list under a common scope
    pub fn new(mut paths: Vec<PathBuf>, scope: PathBuf, origin: Origin) -> Result<Self> {
        if paths.is_empty() {
            return Err(AppError::EmptyUnit);
        }

        let mut formats = BTreeSet::new();
        for path in &paths {
            if !path.starts_with(&scope) {
                return Err(AppError::OutsideScope {
                    path: path.clone(),
                    scope,
                });
            }
            let format = AudioFormat::from_path(path).ok_or_else(|| AppError::UnsupportedFormat {
                format: path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                file: path.clone(),
            })?;
            formats.insert(format);
        }

        paths.sort();
        paths.dedup();

        Ok(Self {
            paths,
            scope,
            origin,
            title: String::new(),
            author: String::new(),
            series: String::new(),
            series_part: None,
            formats,
            confidence: None,
        })
    }

    /// Builds a user-assembled unit scoped to the deepest common ancestor
    pub fn manual_bundle(paths: Vec<PathBuf>) -> Result<Self> {
        let scope = common_ancestor(&paths).ok_or(AppError::EmptyUnit)?;
        Self::new(paths, scope, Origin::ManualBundle)
    }

    /// Sets the best-guess name parts
    pub fn with_guess(
        mut self,
        author: impl Into<String>,
        series: impl Into<String>,
        title: impl Into<String>,
        series_part: Option<f32>,
    ) -> Self {
        self.author = author.into();
        self.series = series.into();
        self.title = title.into();
        self.series_part = series_part;
        self
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_paths(&self.paths)
    }

    /// Key derived from the filename guess, before any metadata lookup
    pub fn guess_key(&self) -> LibraryKey {
        LibraryKey::from_parts(&self.author, &self.series, &self.title)
    }

    pub fn file_count(&self) -> usize {
        self.paths.len()
    }

    pub fn best_format(&self) -> Option<AudioFormat> {
        self.formats.iter().copied().max_by_key(AudioFormat::preference)
    }

    /// Human-readable label for listings
    pub fn display_name(&self) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }
        self.scope
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.scope.display().to_string())
    }
}

fn common_ancestor(paths: &[PathBuf]) -> Option<PathBuf> {
    let first = paths.first()?;
    let mut ancestor: PathBuf = first.parent().unwrap_or(Path::new("")).to_path_buf();
    for path in &paths[1..] {
        while !path.starts_with(&ancestor) {
            if !ancestor.pop() {
                break;
            }
        }
    }
    Some(ancestor)
}
