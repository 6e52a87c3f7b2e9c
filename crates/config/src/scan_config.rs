//! Downloads scanning configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// How the downloads root is walked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Audio extensions considered part of a book
    pub supported_extensions: Vec<String>,

    /// Name of the downloads subfolder holding loose files from many books
    pub collection_folder: String,

    /// Skip dot-files and Synology `@eaDir` folders
    pub skip_hidden: bool,

    /// Follow symbolic links when walking
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            supported_extensions: vec![
                "mp3".to_string(),
                "m4b".to_string(),
                "m4a".to_string(),
                "flac".to_string(),
            ],
            collection_folder: "collection".to_string(),
            skip_hidden: true,
            follow_symlinks: false,
        }
    }
}

impl ScanConfig {
    /// Case-insensitive extension check
    pub fn is_supported_extension(&self, ext: &str) -> bool {
        self.supported_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

impl ConfigSection for ScanConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![Validator::not_empty(
            &self.collection_folder,
            "scan.collection_folder",
        )];

        if self.collection_folder.contains(['/', '\\']) {
            results.push(Err(ValidationError::with_value(
                "scan.collection_folder",
                "must be a single folder name",
                &self.collection_folder,
            )));
        }

        if self.supported_extensions.is_empty() {
            results.push(Err(ValidationError::new(
                "scan.supported_extensions",
                "must list at least one extension",
            )));
        }
        for (i, ext) in self.supported_extensions.iter().enumerate() {
            results.push(Validator::not_empty(
                ext,
                &format!("scan.supported_extensions[{}]", i),
            ));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.supported_extensions = other.supported_extensions;
        self.collection_folder = other.collection_folder;
        self.skip_hidden = other.skip_hidden;
        self.follow_symlinks = other.follow_symlinks;
    }

    fn section_name(&self) -> &'static str {
        "scan"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ScanConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_extensions() {
        let config = ScanConfig::default();
        assert!(config.is_supported_extension("mp3"));
        assert!(config.is_supported_extension("M4B"));
        assert!(config.is_supported_extension("flac"));
        assert!(!config.is_supported_extension("ogg"));
    }

    #[test]
    fn test_empty_collection_folder() {
        let mut config = ScanConfig::default();
        config.collection_folder = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nested_collection_folder_rejected() {
        let mut config = ScanConfig::default();
        config.collection_folder = "a/b".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_extension_list() {
        let mut config = ScanConfig::default();
        config.supported_extensions.clear();
        assert!(config.validate().is_err());
    }
}
