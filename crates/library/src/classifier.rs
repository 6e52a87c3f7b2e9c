// FILE: crates/library/src/classifier.rs
//! Status assignment for scanned units
//!
//! Precedence, first match wins:
//!
//! 1. fingerprint recorded in history: `Done`
//! 2. guess key equals an index key, scores at least the duplicate threshold
//!    against one, or equals the key a history record produced: `Match`
//! 3. manual bundle: `Built`
//! 4. otherwise `Untidy`
//!
//! Classification reads its inputs only and can be re-run freely.

use crate::history::HistoryStore;
use crate::index::LibraryIndex;
use serde::{Deserialize, Serialize};
use shelfsort_core::{BookUnit, ClassificationStatus, LibraryKey, Origin};

/// Where a match was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Library,
    History,
}

/// Details of a `Match` classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetail {
    /// Key of the matched library entry or history record
    pub key: LibraryKey,
    /// 1.0 for an exact key match
    pub score: f64,
    pub source: MatchSource,
    /// The candidate carries a better format than the library copy
    pub upgrade: bool,
}

/// A unit with its assigned status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classified {
    pub unit: BookUnit,
    pub status: ClassificationStatus,
    pub matched: Option<MatchDetail>,
}

/// Assigns statuses against a library index and history
#[derive(Debug, Clone)]
pub struct Classifier {
    duplicate_threshold: f64,
}

impl Classifier {
    pub fn new(duplicate_threshold: f64) -> Self {
        Self {
            duplicate_threshold,
        }
    }

    pub fn classify_all(
        &self,
        units: &[BookUnit],
        index: &LibraryIndex,
        history: &HistoryStore,
    ) -> Vec<Classified> {
        units
            .iter()
            .map(|unit| self.classify(unit, index, history))
            .collect()
    }

    pub fn classify(
        &self,
        unit: &BookUnit,
        index: &LibraryIndex,
        history: &HistoryStore,
    ) -> Classified {
        let (status, matched) = if history.contains(&unit.fingerprint()) {
            (ClassificationStatus::Done, None)
        } else if let Some(detail) = self.find_match(unit, index, history) {
            (ClassificationStatus::Match, Some(detail))
        } else if unit.origin == Origin::ManualBundle {
            (ClassificationStatus::Built, None)
        } else {
            (ClassificationStatus::Untidy, None)
        };

        Classified {
            unit: unit.clone(),
            status,
            matched,
        }
    }

    fn find_match(
        &self,
        unit: &BookUnit,
        index: &LibraryIndex,
        history: &HistoryStore,
    ) -> Option<MatchDetail> {
        let key = unit.guess_key();

        let library_hit = index
            .get(&key)
            .map(|entry| (entry, 1.0))
            .or_else(|| {
                index
                    .best_match(&key)
                    .filter(|(_, score)| *score >= self.duplicate_threshold)
            });

        if let Some((entry, score)) = library_hit {
            let upgrade = match (unit.best_format(), entry.best_format()) {
                (Some(candidate), Some(existing)) => {
                    candidate.preference() > existing.preference()
                }
                (Some(_), None) => true,
                _ => false,
            };
            return Some(MatchDetail {
                key: entry.key.clone(),
                score,
                source: MatchSource::Library,
                upgrade,
            });
        }

        history.find_by_key(&key).map(|(_, record)| MatchDetail {
            key: record.library_key.clone(),
            score: 1.0,
            source: MatchSource::History,
            upgrade: false,
        })
    }
}
