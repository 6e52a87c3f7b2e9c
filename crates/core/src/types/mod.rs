//! Domain types for shelfsort
//!
//! - `unit`: candidate book units produced by scanning
//! - `metadata`: audio formats and finalized book metadata
//! - `library`: normalized keys and on-disk library entries
//! - `history`: fingerprints and processing records
//! - `status`: classification outcome
//! - `common`: timestamps

mod common;
mod history;
mod library;
mod metadata;
mod status;
mod unit;

pub use common::Timestamp;
pub use history::{Fingerprint, HistoryRecord};
pub use library::{normalize_segment, LibraryEntry, LibraryKey};
pub use metadata::{AudioFormat, Metadata};
pub use status::ClassificationStatus;
pub use unit::{BookUnit, Origin};
