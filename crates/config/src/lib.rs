//! shelfsort configuration
//!
//! Each concern owns a section type implementing [`ConfigSection`]. The root
//! [`Config`] is stored as TOML in the platform config directory.
//!
//! - **Graceful degradation**: invalid values are reported as warnings on load
//! - **Atomic writes**: the config file is never left half-written
//! - **Override chain**: defaults < file < environment < command line
//!
//! # Example
//!
//! ```rust,no_run
//! use shelfsort_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load_or_default();
//! println!("Library root: {}", config.library.library_root.display());
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

pub mod app_config;
mod library_config;
mod matching_config;
mod resolver_config;
mod scan_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{apply_env_overrides, ConfigManager, ENV_PREFIX};
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use library_config::{LibraryConfig, TransferMode};
pub use matching_config::MatchingConfig;
pub use resolver_config::ResolverConfig;
pub use scan_config::ScanConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Downloads scanning
    pub scan: ScanConfig,

    /// Grouping and duplicate thresholds
    pub matching: MatchingConfig,

    /// Library locations and placement behaviour
    pub library: LibraryConfig,

    /// Metadata resolver limits
    pub resolver: ResolverConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for result in [
            self.app.validate(),
            self.scan.validate(),
            self.matching.validate(),
            self.library.validate(),
            self.resolver.validate(),
        ] {
            if let Err(mut e) = result {
                errors.append(&mut e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.scan.merge(other.scan);
        self.matching.merge(other.matching);
        self.library.merge(other.library);
        self.resolver.merge(other.resolver);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            scan: ScanConfig::default(),
            matching: MatchingConfig::default(),
            library: LibraryConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_version_is_set() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        let mut override_config = Config::default();
        override_config.matching.duplicate_threshold = 0.75;

        base.merge(override_config);
        assert_eq!(base.matching.duplicate_threshold, 0.75);
    }

    #[test]
    fn test_errors_collected_across_sections() {
        let mut config = Config::default();
        config.matching.grouping_threshold = 2.0;
        config.resolver.timeout_secs = 0;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[matching]\nduplicate_threshold = 0.5\n").unwrap();
        assert_eq!(config.matching.duplicate_threshold, 0.5);
        assert_eq!(config.scan, ScanConfig::default());
    }
}
