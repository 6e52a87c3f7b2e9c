//! Similarity threshold configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GROUPING_THRESHOLD: f64 = 0.80;
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.90;

/// Tunable similarity thresholds, all in `[0.0, 1.0]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    /// Two loose files join the same group at or above this filename similarity
    pub grouping_threshold: f64,

    /// A candidate is a possible duplicate at or above this key similarity
    pub duplicate_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            grouping_threshold: DEFAULT_GROUPING_THRESHOLD,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
        }
    }
}

impl ConfigSection for MatchingConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::unit_interval(self.grouping_threshold, "matching.grouping_threshold"),
            Validator::unit_interval(self.duplicate_threshold, "matching.duplicate_threshold"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.grouping_threshold = other.grouping_threshold;
        self.duplicate_threshold = other.duplicate_threshold;
    }

    fn section_name(&self) -> &'static str {
        "matching"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MatchingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let config = MatchingConfig {
            grouping_threshold: 1.2,
            duplicate_threshold: -0.1,
        };
        assert_eq!(config.validate().unwrap_err().len(), 2);
    }

    #[test]
    fn test_threshold_edges_are_valid() {
        let config = MatchingConfig {
            grouping_threshold: 0.0,
            duplicate_threshold: 1.0,
        };
        assert!(config.validate().is_ok());
    }
}
