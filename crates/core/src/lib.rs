//! Domain types shared by every shelfsort crate
//!
//! Scanning produces [`BookUnit`]s, the library walk produces
//! [`LibraryEntry`]s, and the normalizer persists [`HistoryRecord`]s.
//! All of them meet at the normalized [`LibraryKey`].

pub mod error;
pub mod types;

pub use error::{AppError, ErrorSeverity, Result};
pub use types::{
    AudioFormat, BookUnit, ClassificationStatus, Fingerprint, HistoryRecord, LibraryEntry,
    LibraryKey, Metadata, Origin, Timestamp,
};
