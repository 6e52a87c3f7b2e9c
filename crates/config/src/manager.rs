//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel, TransferMode};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "SHELFSORT";

/// Main configuration manager
///
/// This is the primary interface for loading, saving, and managing configuration.
/// It also owns the directory that relative history and cache paths resolve against.
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager using the default config directory
    ///
    /// - Linux: `~/.config/shelfsort/`
    /// - macOS: `~/Library/Application Support/shelfsort/`
    /// - Windows: `%APPDATA%\shelfsort\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let config_path = config_dir.join("config.toml");
        let persistence = ConfigPersistence::new(config_path);

        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "shelfsort")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "Could not determine user config directory".to_string(),
            })
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Resolves a configured path; relative paths live in the config directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }

    /// Loads the configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file is corrupted, returns an error.
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Validates and atomically saves the configuration
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads, applies `update_fn`, and saves
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use shelfsort_config::{ConfigManager, TransferMode};
    /// # let manager = ConfigManager::new().unwrap();
    /// manager.update(|config| {
    ///     config.library.transfer_mode = TransferMode::Copy;
    /// }).expect("Failed to update config");
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if one doesn't exist
    ///
    /// Returns Ok(true) if a new file was created, Ok(false) if one already exists.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        Ok(true)
    }

    /// Overwrites the config file with default values
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Returns all validation problems in the current config file
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config and applies `SHELFSORT_SECTION_FIELD` overrides
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok());

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

/// Applies overrides from `lookup`, ignoring values that fail to parse
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| lookup(&format!("{}_{}", ENV_PREFIX, suffix));

    if let Some(root) = var("LIBRARY_DOWNLOADS_ROOT") {
        config.library.downloads_root = PathBuf::from(root);
    }

    if let Some(root) = var("LIBRARY_LIBRARY_ROOT") {
        config.library.library_root = PathBuf::from(root);
    }

    if let Some(mode) = var("LIBRARY_TRANSFER_MODE") {
        match mode.to_lowercase().as_str() {
            "move" => config.library.transfer_mode = TransferMode::Move,
            "copy" => config.library.transfer_mode = TransferMode::Copy,
            other => log::warn!("Ignoring unknown transfer mode override: {}", other),
        }
    }

    if let Some(level) = var("APP_LOG_LEVEL") {
        match level.parse::<LogLevel>() {
            Ok(parsed) => config.app.log_level = parsed,
            Err(e) => log::warn!("Ignoring log level override: {}", e),
        }
    }

    if let Some(threshold) = var("MATCHING_DUPLICATE_THRESHOLD") {
        if let Ok(t) = threshold.parse::<f64>() {
            config.matching.duplicate_threshold = t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())
            .expect("Failed to create manager");
        (temp_dir, manager)
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let (_temp_dir, manager) = setup_test_manager();
        let config = manager.load_or_default();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.matching.duplicate_threshold = 0.85;

        manager.save(&config).expect("Should save config");
        let loaded = manager.load().expect("Should load config");

        assert_eq!(loaded.matching.duplicate_threshold, 0.85);
    }

    #[test]
    fn test_update() {
        let (_temp_dir, manager) = setup_test_manager();
        manager.save(&Config::default()).expect("Should save");

        manager
            .update(|config| {
                config.library.delete_sources = true;
            })
            .expect("Should update");

        let loaded = manager.load().expect("Should load");
        assert!(loaded.library.delete_sources);
    }

    #[test]
    fn test_initialize_creates_file() {
        let (_temp_dir, manager) = setup_test_manager();

        let created = manager.initialize().expect("Should initialize");
        assert!(created);
        assert!(manager.config_path().exists());

        let created = manager.initialize().expect("Should initialize");
        assert!(!created);
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.scan.collection_folder = "loose".to_string();
        manager.save(&config).expect("Should save");

        manager.reset().expect("Should reset");

        let loaded = manager.load().expect("Should load");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_validate_reports_problems() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(
            manager.config_path(),
            "[matching]\ngrouping_threshold = -0.5\n",
        )
        .expect("Should write");

        let errors = manager.validate().expect("Should validate");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("grouping_threshold"));
    }

    #[test]
    fn test_save_rejects_invalid_config() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.matching.duplicate_threshold = 1.5;
        manager
            .save(&config)
            .expect_err("Should not save invalid config");
    }

    #[test]
    fn test_resolve_path() {
        let (temp_dir, manager) = setup_test_manager();

        assert_eq!(
            manager.resolve_path(Path::new("history.json")),
            temp_dir.path().join("history.json")
        );

        let absolute = temp_dir.path().join("elsewhere").join("h.json");
        assert_eq!(manager.resolve_path(&absolute), absolute);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SHELFSORT_LIBRARY_DOWNLOADS_ROOT", "/srv/incoming"),
            ("SHELFSORT_LIBRARY_LIBRARY_ROOT", "/srv/books"),
            ("SHELFSORT_LIBRARY_TRANSFER_MODE", "copy"),
            ("SHELFSORT_APP_LOG_LEVEL", "debug"),
            ("SHELFSORT_MATCHING_DUPLICATE_THRESHOLD", "0.95"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.library.downloads_root, PathBuf::from("/srv/incoming"));
        assert_eq!(config.library.library_root, PathBuf::from("/srv/books"));
        assert_eq!(config.library.transfer_mode, TransferMode::Copy);
        assert_eq!(config.app.log_level, LogLevel::Debug);
        assert_eq!(config.matching.duplicate_threshold, 0.95);
    }

    #[test]
    fn test_env_overrides_ignore_garbage() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, |name| match name {
            "SHELFSORT_APP_LOG_LEVEL" => Some("loud".to_string()),
            "SHELFSORT_MATCHING_DUPLICATE_THRESHOLD" => Some("high".to_string()),
            _ => None,
        });

        assert_eq!(config, Config::default());
    }
}
