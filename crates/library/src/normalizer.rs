// FILE: crates/library/src/normalizer.rs
//! File normalizer
//!
//! Places one confirmed unit at `root/Author/[Series/]Title/`:
//!
//! 1. claim a destination directory, suffixing ` (2)`, ` (3)`... past any
//!    non-empty one
//! 2. name files `NN - Title.ext` in original filename order (`Title.ext` alone)
//! 3. move or copy every file; any failure rolls the unit back
//! 4. write tags (failures are warnings)
//! 5. write `metadata.json` (failure is a warning)
//! 6. optionally remove emptied source directories
//! 7. record the unit's fingerprint in history
//!
//! A directory is claimed by exclusively creating a marker file in it, which
//! is removed once placement finishes. Two normalizations racing for the same
//! destination, in this process or another, end up in different directories.

use crate::error::{LibraryError, Result};
use crate::history::HistoryStore;
use crate::tagging::{TagWarning, TagWriter};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use shelfsort_config::TransferMode;
use shelfsort_content_sources::SIDECAR_FILE_NAME;
use shelfsort_core::{BookUnit, HistoryRecord, LibraryKey, Metadata, Origin, Timestamp};
use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Upper bound on ` (n)` suffixes tried before giving up
const MAX_SUFFIX: u32 = 999;

/// Marker held inside a destination while it is being filled
pub const CLAIM_MARKER: &str = ".shelfsort-claim";

const INVALID_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Outcome of a successful placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeReport {
    /// Title directory the files landed in
    pub destination: PathBuf,
    pub library_key: LibraryKey,
    /// Placed files in track order
    pub files: Vec<PathBuf>,
    /// True when a suffix was needed to avoid an occupied directory
    pub suffixed: bool,
    pub tag_warnings: Vec<TagWarning>,
    /// Non-fatal problems outside tagging (metadata.json, cleanup)
    pub warnings: Vec<String>,
    /// Source directories removed after placement
    pub removed_dirs: Vec<PathBuf>,
}

/// Makes a name safe as a single path component on common filesystems
pub fn sanitize_component(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if INVALID_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| c == '.' || c.is_whitespace());

    if trimmed.is_empty() {
        "Unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Destination file name for track `index` (1-based) of `count`
pub fn track_file_name(title: &str, index: usize, count: usize, ext: &str) -> String {
    let ext = ext.to_lowercase();
    if count <= 1 {
        format!("{}.{}", title, ext)
    } else {
        format!("{:02} - {}.{}", index, title, ext)
    }
}

/// Places confirmed units into the library
#[derive(Debug, Clone)]
pub struct FileNormalizer {
    library_root: PathBuf,
    transfer_mode: TransferMode,
}

struct Placement {
    source: PathBuf,
    destination: PathBuf,
}

struct ClaimedDir {
    path: PathBuf,
    name: String,
    suffixed: bool,
    /// Directories created while claiming, outermost first
    created: Vec<PathBuf>,
}

impl FileNormalizer {
    pub fn new(library_root: impl Into<PathBuf>, transfer_mode: TransferMode) -> Self {
        Self {
            library_root: library_root.into(),
            transfer_mode,
        }
    }

    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    /// Unsuffixed `Author/[Series/]Title` directory for `metadata`
    pub fn planned_destination(&self, metadata: &Metadata) -> PathBuf {
        let (parent, title) = self.destination_parts(metadata);
        parent.join(title)
    }

    /// Key of the planned destination, used to serialize placements
    pub fn planned_key(&self, metadata: &Metadata) -> LibraryKey {
        let (author, series, title) = segments(metadata);
        LibraryKey::from_parts(&author, series.as_deref().unwrap_or(""), &title)
    }

    /// Places `unit` using `metadata` and records it in `history`
    pub fn process(
        &self,
        unit: &BookUnit,
        metadata: &Metadata,
        delete_sources: bool,
        history: &mut HistoryStore,
    ) -> Result<NormalizeReport> {
        let report = self.place(unit, metadata, delete_sources)?;
        record_history(history, unit, &report)?;
        Ok(report)
    }

    /// Places `unit` without touching history
    ///
    /// Callers must pass the report to [`record_history`] once placement
    /// succeeded; [`FileNormalizer::process`] does both.
    pub fn place(
        &self,
        unit: &BookUnit,
        metadata: &Metadata,
        delete_sources: bool,
    ) -> Result<NormalizeReport> {
        metadata.validate()?;
        if unit.paths.is_empty() {
            return Err(shelfsort_core::AppError::EmptyUnit.into());
        }

        let (author_dir, series_dir, title) = segments(metadata);
        let (parent, _) = self.destination_parts(metadata);
        let claimed = self.claim(&parent, &title)?;
        if claimed.suffixed {
            info!("Destination occupied, using {}", claimed.path.display());
        }

        let plan = plan_files(unit, &claimed.path, &title);

        // Loaded before files move, since a relative cover lives beside the sources
        let tag_writer = TagWriter::new(metadata, &unit.scope);

        let mut placed: Vec<Placement> = Vec::with_capacity(plan.len());
        for step in plan {
            if let Err(e) = self.transfer(&step.source, &step.destination) {
                error!(
                    "Placing {} failed: {}, rolling back {} files",
                    step.source.display(),
                    e,
                    placed.len()
                );
                self.rollback(&placed, &claimed);
                return Err(LibraryError::MoveFailed {
                    file: step.source,
                    reason: e.to_string(),
                });
            }
            placed.push(step);
        }

        let files: Vec<PathBuf> = placed.iter().map(|p| p.destination.clone()).collect();
        let tag_warnings = tag_writer.write_all(&files);

        let mut warnings = Vec::new();
        if let Err(e) = write_snapshot(&claimed.path, metadata) {
            warn!("Could not write {}: {}", SIDECAR_FILE_NAME, e);
            warnings.push(format!("{}: {}", SIDECAR_FILE_NAME, e));
        }
        if let Err(e) = fs::remove_file(claimed.path.join(CLAIM_MARKER)) {
            warn!("Could not release {}: {}", claimed.path.display(), e);
            warnings.push(format!("{}: {}", CLAIM_MARKER, e));
        }

        let removed_dirs = if delete_sources {
            self.delete_sources(unit, &mut warnings)
        } else {
            Vec::new()
        };

        let library_key = LibraryKey::from_parts(
            &author_dir,
            series_dir.as_deref().unwrap_or(""),
            &claimed.name,
        );

        info!("Placed {} files at {}", files.len(), claimed.path.display());

        Ok(NormalizeReport {
            destination: claimed.path,
            library_key,
            files,
            suffixed: claimed.suffixed,
            tag_warnings,
            warnings,
            removed_dirs,
        })
    }

    fn destination_parts(&self, metadata: &Metadata) -> (PathBuf, String) {
        let (author, series, title) = segments(metadata);
        let mut parent = self.library_root.join(author);
        if let Some(series) = series {
            parent.push(series);
        }
        (parent, title)
    }

    fn claim(&self, parent: &Path, title: &str) -> Result<ClaimedDir> {
        let created = missing_ancestors(parent, &self.library_root);
        fs::create_dir_all(parent)?;

        for n in 1..=MAX_SUFFIX {
            let name = if n == 1 {
                title.to_string()
            } else {
                format!("{} ({})", title, n)
            };
            let path = parent.join(&name);

            let fresh = match fs::create_dir(&path) {
                Ok(()) => true,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => false,
                Err(e) => return Err(e.into()),
            };
            if !path.is_dir() || !acquire(&path)? {
                continue;
            }

            if !fresh {
                debug!("Reusing empty directory {}", path.display());
            }
            let mut created = created.clone();
            if fresh {
                created.push(path.clone());
            }
            return Ok(ClaimedDir {
                path,
                name,
                suffixed: n > 1,
                created,
            });
        }

        Err(LibraryError::DestinationCollision(parent.join(title)))
    }

    fn transfer(&self, source: &Path, destination: &Path) -> io::Result<()> {
        if destination.exists() {
            return Err(io::Error::new(
                ErrorKind::AlreadyExists,
                format!("{} already exists", destination.display()),
            ));
        }

        match self.transfer_mode {
            TransferMode::Copy => fs::copy(source, destination).map(|_| ()),
            TransferMode::Move => move_file(source, destination),
        }
    }

    fn rollback(&self, placed: &[Placement], claimed: &ClaimedDir) {
        for step in placed.iter().rev() {
            let result = match self.transfer_mode {
                TransferMode::Copy => fs::remove_file(&step.destination),
                TransferMode::Move => move_file(&step.destination, &step.source),
            };
            if let Err(e) = result {
                error!(
                    "Rollback of {} failed: {}",
                    step.destination.display(),
                    e
                );
            }
        }

        let _ = fs::remove_file(claimed.path.join(CLAIM_MARKER));
        for dir in claimed.created.iter().rev() {
            if fs::remove_dir(dir).is_err() {
                break;
            }
        }
    }

    /// Removes sources (copy mode) and prunes directories left empty
    fn delete_sources(&self, unit: &BookUnit, warnings: &mut Vec<String>) -> Vec<PathBuf> {
        if self.transfer_mode == TransferMode::Copy {
            for source in &unit.paths {
                if let Err(e) = fs::remove_file(source) {
                    warnings.push(format!("{}: {}", source.display(), e));
                }
            }
        }

        let inclusive = unit.origin == Origin::FolderGrouped;
        let mut dirs: Vec<PathBuf> = unit
            .paths
            .iter()
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect();
        dirs.sort();
        dirs.dedup();
        // Deepest first so parents are empty by the time they are tried
        dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));

        let mut removed = Vec::new();
        for start in dirs {
            let mut current = Some(start.as_path());
            while let Some(dir) = current {
                if !dir.starts_with(&unit.scope) || (dir == unit.scope && !inclusive) {
                    break;
                }
                match fs::remove_dir(dir) {
                    Ok(()) => {
                        debug!("Removed empty source directory {}", dir.display());
                        removed.push(dir.to_path_buf());
                    }
                    Err(_) => break,
                }
                current = dir.parent();
            }
        }
        removed
    }
}

/// Records a finished placement under the unit's fingerprint and saves
pub fn record_history(
    history: &mut HistoryStore,
    unit: &BookUnit,
    report: &NormalizeReport,
) -> Result<()> {
    history.record(
        unit.fingerprint(),
        HistoryRecord {
            processed_at: Timestamp::now(),
            library_key: report.library_key.clone(),
            destination: report.destination.clone(),
            sources: unit.paths.clone(),
        },
    );
    history.save()
}

/// Sanitized author, optional series, and title directory names
fn segments(metadata: &Metadata) -> (String, Option<String>, String) {
    (
        sanitize_component(&metadata.author),
        metadata.series_name().map(sanitize_component),
        sanitize_component(&metadata.title),
    )
}

fn plan_files(unit: &BookUnit, destination: &Path, title: &str) -> Vec<Placement> {
    let mut sources: Vec<&PathBuf> = unit.paths.iter().collect();
    sources.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));

    let count = sources.len();
    sources
        .into_iter()
        .enumerate()
        .map(|(i, source)| {
            let ext = source
                .extension()
                .and_then(OsStr::to_str)
                .unwrap_or_default();
            Placement {
                source: source.clone(),
                destination: destination.join(track_file_name(title, i + 1, count, ext)),
            }
        })
        .collect()
}

/// Rename, falling back to copy and delete across filesystems
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!("Cross-device move of {}", source.display());
            fs::copy(source, destination)?;
            if let Err(e) = fs::remove_file(source) {
                let _ = fs::remove_file(destination);
                return Err(e);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn write_snapshot(dir: &Path, metadata: &Metadata) -> Result<()> {
    let body = serde_json::to_string_pretty(metadata)?;
    fs::write(dir.join(SIDECAR_FILE_NAME), body)?;
    Ok(())
}

/// Takes `dir` by creating its marker; false when another claimant holds it
/// or the directory already has content
fn acquire(dir: &Path) -> io::Result<bool> {
    let marker = dir.join(CLAIM_MARKER);
    match OpenOptions::new().write(true).create_new(true).open(&marker) {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e),
    }

    let only_marker = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .all(|e| e.file_name() == CLAIM_MARKER);
    if !only_marker {
        fs::remove_file(&marker)?;
    }
    Ok(only_marker)
}

/// Ancestors of `dir` below `root` that do not exist yet, outermost first
fn missing_ancestors(dir: &Path, root: &Path) -> Vec<PathBuf> {
    let mut missing: Vec<PathBuf> = dir
        .ancestors()
        .take_while(|a| a.starts_with(root) && *a != root)
        .filter(|a| !a.exists())
        .map(Path::to_path_buf)
        .collect();
    missing.reverse();
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("Dune: Messiah"), "Dune_ Messiah");
        assert_eq!(sanitize_component("AC/DC"), "AC_DC");
        assert_eq!(sanitize_component("  Trailing dots... "), "Trailing dots");
        assert_eq!(sanitize_component(".hidden"), "hidden");
        assert_eq!(sanitize_component("   "), "Unknown");
        assert_eq!(sanitize_component("What?*"), "What__");
    }

    #[test]
    fn test_track_file_name() {
        assert_eq!(track_file_name("Dune", 1, 1, "M4B"), "Dune.m4b");
        assert_eq!(track_file_name("Dune", 3, 12, "mp3"), "03 - Dune.mp3");
        assert_eq!(track_file_name("Dune", 100, 120, "mp3"), "100 - Dune.mp3");
    }

    #[test]
    fn test_planned_destination_omits_missing_series() {
        let normalizer = FileNormalizer::new("/lib", TransferMode::Move);

        let meta = Metadata::new("Dune", "Frank Herbert");
        assert_eq!(
            normalizer.planned_destination(&meta),
            PathBuf::from("/lib/Frank Herbert/Dune")
        );

        let meta = meta.with_series("Dune Chronicles", Some(1.0));
        assert_eq!(
            normalizer.planned_destination(&meta),
            PathBuf::from("/lib/Frank Herbert/Dune Chronicles/Dune")
        );
    }

    #[test]
    fn test_planned_key_matches_metadata_key() {
        let normalizer = FileNormalizer::new("/lib", TransferMode::Move);
        let meta = Metadata::new("Book One", "J. Smith").with_series("Series X", None);
        assert_eq!(normalizer.planned_key(&meta), meta.library_key());
    }

    #[test]
    fn test_acquire_is_exclusive() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("Title");
        fs::create_dir(&target).unwrap();

        assert!(acquire(&target).unwrap());
        assert!(!acquire(&target).unwrap());
        assert!(target.join(CLAIM_MARKER).exists());
    }

    #[test]
    fn test_acquire_refuses_directory_with_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("Title");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("Title.mp3"), b"audio").unwrap();

        assert!(!acquire(&target).unwrap());
        assert!(!target.join(CLAIM_MARKER).exists());
    }

    #[test]
    fn test_missing_ancestors() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("lib");
        fs::create_dir(&root).unwrap();

        let missing = missing_ancestors(&root.join("A/S"), &root);
        assert_eq!(missing, vec![root.join("A"), root.join("A/S")]);
    }
}
