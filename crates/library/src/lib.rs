//! shelfsort library engine
//!
//! Scans a downloads directory into candidate book units, indexes the
//! organized library, classifies each unit against the index and the
//! processing history, and places confirmed units into the library.
//!
//! ```text
//! DownloadsScanner ─┐
//! LibraryIndex ─────┼─> Classifier ─> (confirmation) ─> FileNormalizer ─> HistoryStore
//! HistoryStore ─────┘
//! ```
//!
//! [`LibraryManager`] bundles configuration and persisted state for callers
//! that drive the whole flow.

pub mod cache;
pub mod classifier;
pub mod error;
pub mod extract;
pub mod grouper;
pub mod history;
pub mod index;
pub mod manager;
pub mod normalizer;
pub mod scanner;
pub mod tagging;

pub use cache::{directory_fingerprint, ScanCache};
pub use classifier::{Classified, Classifier, MatchDetail, MatchSource};
pub use error::{LibraryError, LibraryResult};
pub use extract::{extract_guess, grouping_stem, NameGuess};
pub use grouper::{FileGroup, SimilarityGrouper};
pub use history::HistoryStore;
pub use index::LibraryIndex;
pub use manager::{find_unit, ClassifyReport, LibraryManager};
pub use normalizer::{
    record_history, sanitize_component, track_file_name, FileNormalizer, NormalizeReport,
    CLAIM_MARKER,
};
pub use scanner::{DownloadsScanner, ScanReport, ScanWarning};
pub use tagging::{tag_scheme, TagWarning, TagWriter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports_accessible() {
        let _ = SimilarityGrouper::new(0.8);
        let _ = Classifier::new(0.9);
        let _ = HistoryStore::in_memory();
        assert_eq!(sanitize_component(""), "Unknown");
    }
}
