//! Metadata resolver configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits applied around external metadata lookups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Seconds to wait for a resolver before giving up
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ConfigSection for ResolverConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![Validator::in_range(
            self.timeout_secs,
            1,
            600,
            "resolver.timeout_secs",
        )])
    }

    fn merge(&mut self, other: Self) {
        self.timeout_secs = other.timeout_secs;
    }

    fn section_name(&self) -> &'static str {
        "resolver"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ResolverConfig { timeout_secs: 0 };
        assert!(config.validate().is_err());
    }
}
