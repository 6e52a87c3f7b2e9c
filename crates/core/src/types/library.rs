//! Library keys and entries
//!
//! A [`LibraryKey`] is the normalized `author/series/title` triple used for
//! index lookup, duplicate detection and history records. Each segment is
//! normalized by [`normalize_segment`]:
//!
//! 1. Unicode NFD decomposition, combining marks dropped (diacritics stripped)
//! 2. Lower-cased
//! 3. Apostrophes (`'` and `’`) removed; every other non-alphanumeric
//!    character becomes a space
//! 4. Whitespace collapsed and trimmed
//! 5. A leading article (`the`, `a`, `an`) is dropped when more words follow
//!
//! Segments are joined with `/`, which cannot survive step 3, so a missing
//! series yields `author//title` and is distinct from any populated series.

use crate::types::{AudioFormat, Metadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const ARTICLES: &[&str] = &["the", "a", "an"];

/// Normalizes one key segment
pub fn normalize_segment(segment: &str) -> String {
    let mut spaced = String::with_capacity(segment.len());
    for ch in segment.nfd() {
        if is_combining_mark(ch) || ch == '\'' || ch == '\u{2019}' {
            continue;
        }
        if ch.is_alphanumeric() {
            spaced.extend(ch.to_lowercase());
        } else {
            spaced.push(' ');
        }
    }

    let words: Vec<&str> = spaced.split_whitespace().collect();
    let words = match words.split_first() {
        Some((first, rest)) if !rest.is_empty() && ARTICLES.contains(first) => rest,
        _ => &words[..],
    };
    words.join(" ")
}

/// Normalized `author/series/title` key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryKey(String);

impl LibraryKey {
    /// Builds a key from raw segments; an empty series stays an empty segment
    pub fn from_parts(author: &str, series: &str, title: &str) -> Self {
        Self(format!(
            "{}/{}/{}",
            normalize_segment(author),
            normalize_segment(series),
            normalize_segment(title)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The normalized title segment
    pub fn title(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }
}

impl fmt::Display for LibraryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A book realized on disk under `root/Author/[Series/]Title/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub key: LibraryKey,
    pub author: String,
    /// Empty when the book sits directly under the author folder
    pub series: String,
    pub title: String,
    /// The title directory
    pub path: PathBuf,
    pub files: Vec<PathBuf>,
    pub formats: BTreeSet<AudioFormat>,
    /// Snapshot read from `metadata.json`, a hint only
    pub metadata: Option<Metadata>,
}

impl LibraryEntry {
    pub fn new(author: String, series: String, title: String, path: PathBuf) -> Self {
        Self {
            key: LibraryKey::from_parts(&author, &series, &title),
            author,
            series,
            title,
            path,
            files: Vec::new(),
            formats: BTreeSet::new(),
            metadata: None,
        }
    }

    /// Highest format preference present in this entry
    pub fn best_format(&self) -> Option<AudioFormat> {
        self.formats.iter().copied().max_by_key(AudioFormat::preference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_strips_punctuation() {
        assert_eq!(normalize_segment("J. Smith"), "j smith");
        assert_eq!(normalize_segment("J.Smith"), "j smith");
        assert_eq!(normalize_segment("Ender's Game"), "enders game");
        assert_eq!(normalize_segment("Spider-Man:  Origins"), "spider man origins");
    }

    #[test]
    fn test_normalize_strips_diacritics() {
        assert_eq!(normalize_segment("Émile Zola"), "emile zola");
        assert_eq!(normalize_segment("Cien años"), "cien anos");
    }

    #[test]
    fn test_normalize_drops_leading_article() {
        assert_eq!(normalize_segment("The Hobbit"), "hobbit");
        assert_eq!(normalize_segment("A Game of Thrones"), "game of thrones");
        assert_eq!(normalize_segment("An Echo"), "echo");
        // Only leading, and only when something follows
        assert_eq!(normalize_segment("The"), "the");
        assert_eq!(normalize_segment("Into the Wild"), "into the wild");
        assert_eq!(normalize_segment("Theory"), "theory");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_segment(""), "");
        assert_eq!(normalize_segment("  -- "), "");
    }

    #[test]
    fn test_empty_series_is_distinct() {
        let without = LibraryKey::from_parts("Author", "", "Title");
        let with = LibraryKey::from_parts("Author", "Saga", "Title");
        assert_eq!(without.as_str(), "author//title");
        assert_ne!(without, with);
    }

    #[test]
    fn test_key_title_segment() {
        let key = LibraryKey::from_parts("Author", "Saga", "The Title");
        assert_eq!(key.title(), "title");
    }

    #[test]
    fn test_best_format() {
        let mut entry = LibraryEntry::new(
            "A".to_string(),
            String::new(),
            "T".to_string(),
            PathBuf::from("/lib/A/T"),
        );
        assert_eq!(entry.best_format(), None);
        entry.formats.insert(AudioFormat::Mp3);
        entry.formats.insert(AudioFormat::M4b);
        assert_eq!(entry.best_format(), Some(AudioFormat::M4b));
    }
}
