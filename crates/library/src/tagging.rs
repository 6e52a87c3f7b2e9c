// FILE: crates/library/src/tagging.rs
//! Tag writing for placed files
//!
//! Each format gets its native scheme: ID3v2 for mp3, MP4 ilst atoms for
//! m4b/m4a and Vorbis comments for flac. Failures are returned as
//! [`TagWarning`]s; placement never depends on them.

use lofty::config::WriteOptions;
use lofty::picture::{Picture, PictureType};
use lofty::prelude::*;
use lofty::tag::{ItemKey, Tag, TagType};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use shelfsort_core::{AudioFormat, Metadata};
use std::fs::File;
use std::path::{Path, PathBuf};

const GENRE: &str = "Audiobook";

/// A file whose tags could not be written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagWarning {
    pub file: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for TagWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.reason)
    }
}

/// Native tag scheme for a format
pub fn tag_scheme(format: AudioFormat) -> TagType {
    match format {
        AudioFormat::Mp3 => TagType::Id3v2,
        AudioFormat::M4b | AudioFormat::M4a => TagType::Mp4Ilst,
        AudioFormat::Flac => TagType::VorbisComments,
    }
}

/// Writes one book's metadata into its files
pub struct TagWriter<'a> {
    metadata: &'a Metadata,
    cover: Option<Picture>,
}

impl<'a> TagWriter<'a> {
    /// Prepares a writer; a local cover path is resolved against `base_dir`
    pub fn new(metadata: &'a Metadata, base_dir: &Path) -> Self {
        let cover = metadata
            .cover
            .as_deref()
            .and_then(|reference| load_cover(reference, base_dir));
        Self { metadata, cover }
    }

    pub fn has_cover(&self) -> bool {
        self.cover.is_some()
    }

    /// Builds the tag for track `track` of `total` (both 1 for single files)
    pub fn build_tag(&self, format: AudioFormat, track: u32, total: u32) -> Tag {
        let meta = self.metadata;
        let mut tag = Tag::new(tag_scheme(format));

        tag.set_title(meta.title.clone());
        tag.set_artist(meta.author.clone());
        tag.set_album(
            meta.series_name()
                .map(str::to_string)
                .unwrap_or_else(|| meta.title.clone()),
        );
        tag.set_genre(GENRE.to_string());
        tag.insert_text(ItemKey::AlbumArtist, meta.author.clone());

        if total > 1 {
            tag.set_track(track);
            tag.set_track_total(total);
        }
        if let Some(narrator) = &meta.narrator {
            tag.insert_text(ItemKey::Composer, narrator.clone());
        }
        if let Some(description) = &meta.description {
            tag.set_comment(description.clone());
        }
        if let Some(label) = meta.series_label() {
            tag.insert_text(ItemKey::ContentGroup, label);
        }
        if let Some(cover) = &self.cover {
            tag.push_picture(cover.clone());
        }

        tag
    }

    /// Tags every file; `files` are in track order
    pub fn write_all(&self, files: &[PathBuf]) -> Vec<TagWarning> {
        let total = files.len() as u32;
        let mut warnings = Vec::new();

        for (i, file) in files.iter().enumerate() {
            if let Err(reason) = self.write(file, i as u32 + 1, total) {
                warn!("Tagging failed for {}: {}", file.display(), reason);
                warnings.push(TagWarning {
                    file: file.clone(),
                    reason,
                });
            }
        }

        warnings
    }

    fn write(&self, file: &Path, track: u32, total: u32) -> Result<(), String> {
        let format = AudioFormat::from_path(file)
            .ok_or_else(|| "not a supported audio file".to_string())?;
        let tag = self.build_tag(format, track, total);

        tag.save_to_path(file, WriteOptions::default())
            .map_err(|e| e.to_string())?;
        debug!("Tagged {}", file.display());
        Ok(())
    }
}

/// Loads a front cover from a local file; URLs and unreadable files yield `None`
fn load_cover(reference: &str, base_dir: &Path) -> Option<Picture> {
    if reference.contains("://") {
        debug!("Skipping remote cover {}", reference);
        return None;
    }

    let path = Path::new(reference);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };

    let mut file = match File::open(&path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Cannot open cover {}: {}", path.display(), e);
            return None;
        }
    };

    match Picture::from_reader(&mut file) {
        Ok(mut picture) => {
            picture.set_pic_type(PictureType::CoverFront);
            Some(picture)
        }
        Err(e) => {
            warn!("Cannot read cover {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metadata() -> Metadata {
        let mut meta = Metadata::new("The Final Empire", "Brandon Sanderson")
            .with_series("Mistborn", Some(1.0))
            .with_narrator("Michael Kramer");
        meta.description = Some("Ash falls.".to_string());
        meta
    }

    #[test]
    fn test_schemes() {
        assert_eq!(tag_scheme(AudioFormat::Mp3), TagType::Id3v2);
        assert_eq!(tag_scheme(AudioFormat::M4b), TagType::Mp4Ilst);
        assert_eq!(tag_scheme(AudioFormat::M4a), TagType::Mp4Ilst);
        assert_eq!(tag_scheme(AudioFormat::Flac), TagType::VorbisComments);
    }

    #[test]
    fn test_build_tag_fields() {
        let meta = metadata();
        let writer = TagWriter::new(&meta, Path::new("/nowhere"));
        let tag = writer.build_tag(AudioFormat::M4b, 2, 3);

        assert_eq!(tag.title().as_deref(), Some("The Final Empire"));
        assert_eq!(tag.artist().as_deref(), Some("Brandon Sanderson"));
        assert_eq!(tag.album().as_deref(), Some("Mistborn"));
        assert_eq!(tag.genre().as_deref(), Some("Audiobook"));
        assert_eq!(tag.track(), Some(2));
        assert_eq!(tag.track_total(), Some(3));
        assert_eq!(tag.get_string(&ItemKey::Composer), Some("Michael Kramer"));
        assert_eq!(tag.get_string(&ItemKey::ContentGroup), Some("Mistborn #1"));
    }

    #[test]
    fn test_single_file_has_no_track_and_album_falls_back_to_title() {
        let meta = Metadata::new("Dune", "Frank Herbert");
        let writer = TagWriter::new(&meta, Path::new("/nowhere"));
        let tag = writer.build_tag(AudioFormat::Mp3, 1, 1);

        assert_eq!(tag.album().as_deref(), Some("Dune"));
        assert_eq!(tag.track(), None);
    }

    #[test]
    fn test_remote_and_missing_covers_are_skipped() {
        let mut meta = metadata();
        meta.cover = Some("https://example.invalid/c.jpg".to_string());
        assert!(!TagWriter::new(&meta, Path::new("/")).has_cover());

        meta.cover = Some("missing.jpg".to_string());
        let dir = TempDir::new().unwrap();
        assert!(!TagWriter::new(&meta, dir.path()).has_cover());
    }

    #[test]
    fn test_unwritable_file_is_a_warning() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("broken.m4b");
        std::fs::write(&file, b"definitely not an mp4 container").unwrap();

        let meta = metadata();
        let warnings = TagWriter::new(&meta, dir.path()).write_all(&[file.clone()]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].file, file);
    }
}
