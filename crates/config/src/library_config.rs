//! Library locations and placement configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How accepted files reach the library
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Rename into place; sources disappear
    #[default]
    Move,
    /// Copy into place; sources stay (e.g. still seeding)
    Copy,
}

impl std::fmt::Display for TransferMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferMode::Move => write!(f, "move"),
            TransferMode::Copy => write!(f, "copy"),
        }
    }
}

/// Library management settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory new downloads land in
    pub downloads_root: PathBuf,

    /// Root of the organized `Author/Series/Title` library
    pub library_root: PathBuf,

    /// Processing history (relative paths resolve against the config dir)
    pub history_file: PathBuf,

    /// Scan cache (relative paths resolve against the config dir)
    pub cache_file: PathBuf,

    /// Move or copy accepted files
    pub transfer_mode: TransferMode,

    /// Remove emptied source folders after placement
    pub delete_sources: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            downloads_root: PathBuf::from("downloads"),
            library_root: PathBuf::from("audiobooks"),
            history_file: PathBuf::from("history.json"),
            cache_file: PathBuf::from("scan-cache.json"),
            transfer_mode: TransferMode::Move,
            delete_sources: false,
        }
    }
}

impl ConfigSection for LibraryConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = Vec::new();

        // Existence is not checked: the library root is created on first placement
        for (path, field) in [
            (&self.downloads_root, "library.downloads_root"),
            (&self.library_root, "library.library_root"),
            (&self.history_file, "library.history_file"),
            (&self.cache_file, "library.cache_file"),
        ] {
            if path.as_os_str().is_empty() {
                results.push(Err(ValidationError::new(field, "must not be empty")));
            }
        }

        if !self.downloads_root.as_os_str().is_empty()
            && self.downloads_root == self.library_root
        {
            results.push(Err(ValidationError::with_value(
                "library.library_root",
                "must differ from library.downloads_root",
                self.library_root.display(),
            )));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.downloads_root = other.downloads_root;
        self.library_root = other.library_root;
        self.history_file = other.history_file;
        self.cache_file = other.cache_file;
        self.transfer_mode = other.transfer_mode;
        self.delete_sources = other.delete_sources;
    }

    fn section_name(&self) -> &'static str {
        "library"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LibraryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.transfer_mode, TransferMode::Move);
        assert!(!config.delete_sources);
    }

    #[test]
    fn test_empty_library_root() {
        let mut config = LibraryConfig::default();
        config.library_root = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_same_roots_rejected() {
        let mut config = LibraryConfig::default();
        config.library_root = config.downloads_root.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transfer_mode_serde() {
        let config: LibraryConfig = toml::from_str("transfer_mode = \"copy\"").unwrap();
        assert_eq!(config.transfer_mode, TransferMode::Copy);
        assert_eq!(TransferMode::Copy.to_string(), "copy");
    }

    #[test]
    fn test_merge() {
        let mut base = LibraryConfig::default();
        let mut other = LibraryConfig::default();
        other.delete_sources = true;
        other.library_root = PathBuf::from("/books");

        base.merge(other);
        assert!(base.delete_sources);
        assert_eq!(base.library_root, PathBuf::from("/books"));
    }
}
