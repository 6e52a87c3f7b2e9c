//! Classification outcome

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status assigned to every scanned book unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationStatus {
    /// New and unseen
    Untidy,
    /// Assembled by hand, not matched against the library
    Built,
    /// Overlaps an existing library entry or history record
    Match,
    /// Fingerprint already in history
    Done,
}

impl ClassificationStatus {
    /// Whether the unit still needs user attention
    pub fn is_pending(&self) -> bool {
        !matches!(self, Self::Done)
    }
}

impl fmt::Display for ClassificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untidy => write!(f, "untidy"),
            Self::Built => write!(f, "built"),
            Self::Match => write!(f, "match"),
            Self::Done => write!(f, "done"),
        }
    }
}
