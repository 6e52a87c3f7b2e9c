//! Audio format and book metadata domain models

use crate::error::{AppError, Result};
use crate::types::LibraryKey;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Audio formats shelfsort scans and places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    M4b,
    M4a,
    Flac,
}

impl AudioFormat {
    /// All handled formats
    pub const ALL: [AudioFormat; 4] = [Self::Mp3, Self::M4b, Self::M4a, Self::Flac];

    /// Detects format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "m4b" => Some(Self::M4b),
            "m4a" => Some(Self::M4a),
            "flac" => Some(Self::Flac),
            _ => None,
        }
    }

    /// Detects format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Returns the canonical file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::M4b => "m4b",
            Self::M4a => "m4a",
            Self::Flac => "flac",
        }
    }

    /// Library preference; higher is better
    ///
    /// Single-file m4b with chapters is the preferred audiobook container.
    pub fn preference(&self) -> u8 {
        match self {
            Self::M4b => 4,
            Self::M4a => 3,
            Self::Flac => 2,
            Self::Mp3 => 1,
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension().to_uppercase())
    }
}

/// Finalized book metadata, produced by a resolver or by manual edit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    pub narrator: Option<String>,
    pub series: Option<String>,
    pub series_part: Option<f32>,
    /// Cover image reference: a URL or a local file path
    pub cover: Option<String>,
    pub description: Option<String>,
    /// Catalog identifier (e.g. an ASIN) the metadata was resolved from
    pub asin: Option<String>,
}

impl Metadata {
    /// Creates metadata with the required fields
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Default::default()
        }
    }

    pub fn with_series(mut self, series: impl Into<String>, part: Option<f32>) -> Self {
        self.series = Some(series.into());
        self.series_part = part;
        self
    }

    pub fn with_narrator(mut self, narrator: impl Into<String>) -> Self {
        self.narrator = Some(narrator.into());
        self
    }

    /// Series name if present and not blank
    pub fn series_name(&self) -> Option<&str> {
        self.series
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// "Series #3" style label used for grouping tags
    pub fn series_label(&self) -> Option<String> {
        let series = self.series_name()?;
        Some(match self.series_part {
            Some(part) if part.fract() == 0.0 => format!("{} #{}", series, part as i64),
            Some(part) => format!("{} #{}", series, part),
            None => series.to_string(),
        })
    }

    /// Normalized key this metadata would occupy in the library
    pub fn library_key(&self) -> LibraryKey {
        LibraryKey::from_parts(&self.author, self.series_name().unwrap_or(""), &self.title)
    }

    /// Checks the fields the normalizer relies on
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::MissingMetadata {
                field: "title".to_string(),
            });
        }
        if self.author.trim().is_empty() {
            return Err(AppError::MissingMetadata {
                field: "author".to_string(),
            });
        }
        if let Some(part) = self.series_part {
            if !part.is_finite() || part < 0.0 {
                return Err(AppError::InvalidMetadata {
                    field: "series_part".to_string(),
                    value: part.to_string(),
                });
            }
        }
        Ok(())
    }
}
