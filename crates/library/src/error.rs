// FILE: crates/library/src/error.rs

use shelfsort_config::ConfigError;
use shelfsort_core::AppError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Domain error: {0}")]
    Core(#[from] AppError),

    #[error("Cannot scan {path}: {reason}")]
    Scan { path: PathBuf, reason: String },

    #[error("Failed to place {file}: {reason}")]
    MoveFailed { file: PathBuf, reason: String },

    #[error("No free destination next to {0}")]
    DestinationCollision(PathBuf),

    #[error("History store {path}: {reason}")]
    History { path: PathBuf, reason: String },

    #[error("No metadata available for {subject}: {reason}")]
    MetadataUnavailable { subject: String, reason: String },

    #[error("No book unit matches '{0}'")]
    UnitNotFound(String),

    #[error("'{selector}' matches {count} book units")]
    AmbiguousUnit { selector: String, count: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    /// Whether the failure leaves the unit pending rather than broken
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MetadataUnavailable { .. } | Self::DestinationCollision(_)
        )
    }
}

// Both type aliases for convenience
pub type Result<T> = std::result::Result<T, LibraryError>;
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
