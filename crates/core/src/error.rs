//! Error types for shelfsort domain values
//!
//! Every error carries a severity so callers can decide whether to keep
//! going (a skipped file), surface a warning (a book left pending) or stop.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// The caller can retry or skip the item and continue
    Recoverable,
    /// The item stays pending but the run continues
    Degraded,
    /// The operation cannot continue without user action
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for shelfsort domain operations
#[derive(Error, Debug)]
pub enum AppError {
    // ===== File System Errors =====
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Permission denied for file operation
    #[error("Permission denied: {operation} on {path}")]
    PermissionDenied { operation: String, path: PathBuf },

    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },

    // ===== Book Unit Errors =====
    /// A book unit must contain at least one file
    #[error("Book unit has no files")]
    EmptyUnit,

    /// A file does not live under the unit's scope
    #[error("{path} is outside the unit scope {scope}")]
    OutsideScope { path: PathBuf, scope: PathBuf },

    /// File extension is not one of the handled audio formats
    #[error("Unsupported audio format: {format} in file {file}")]
    UnsupportedFormat { format: String, file: PathBuf },

    // ===== Metadata Errors =====
    /// Invalid metadata value
    #[error("Invalid metadata: {field} has invalid value '{value}'")]
    InvalidMetadata { field: String, value: String },

    /// Missing required metadata
    #[error("Missing required metadata: {field}")]
    MissingMetadata { field: String },

    // ===== Generic Errors =====
    /// Operation cancelled by user
    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::FileNotFound { .. } | Self::UnsupportedFormat { .. } => {
                ErrorSeverity::Recoverable
            }

            Self::InvalidMetadata { .. }
            | Self::MissingMetadata { .. }
            | Self::Cancelled { .. } => ErrorSeverity::Degraded,

            Self::PermissionDenied { .. }
            | Self::IoError { .. }
            | Self::EmptyUnit
            | Self::OutsideScope { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns true if the error only affects a single item
    pub fn is_skippable(&self) -> bool {
        self.severity() < ErrorSeverity::Fatal
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        Self::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Result type alias for shelfsort domain operations
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Recoverable < ErrorSeverity::Degraded);
        assert!(ErrorSeverity::Degraded < ErrorSeverity::Fatal);
    }

    #[test]
    fn test_missing_metadata_is_degraded() {
        let err = AppError::MissingMetadata {
            field: "title".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Degraded);
        assert!(err.is_skippable());
    }

    #[test]
    fn test_empty_unit_is_fatal() {
        assert_eq!(AppError::EmptyUnit.severity(), ErrorSeverity::Fatal);
        assert!(!AppError::EmptyUnit.is_skippable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let err: AppError = io_err.into();
        assert!(matches!(err, AppError::IoError { .. }));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_error_display() {
        let err = AppError::InvalidMetadata {
            field: "series_part".to_string(),
            value: "-1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid metadata: series_part has invalid value '-1'"
        );
    }
}
