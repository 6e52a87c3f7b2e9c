// FILE: crates/cli/src/app.rs
//! Explicit application state handed to every command

use anyhow::{Context, Result};
use clap::ArgMatches;
use shelfsort_config::{Config, ConfigManager};
use shelfsort_library::LibraryManager;
use std::path::PathBuf;

pub struct AppState {
    pub config_manager: ConfigManager,
    /// Effective configuration: defaults < file < environment < flags
    pub config: Config,
}

impl AppState {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let config_manager = match matches.get_one::<String>("config-dir") {
            Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
            None => ConfigManager::new(),
        }
        .context("Cannot determine config directory")?;

        let mut config = config_manager
            .load_with_env_overrides()
            .with_context(|| format!("Cannot read {}", config_manager.config_path().display()))?;
        apply_flag_overrides(&mut config, matches);

        Ok(Self {
            config_manager,
            config,
        })
    }

    /// Starts env_logger; RUST_LOG wins over config and `-v`
    pub fn init_logging(&self, verbose: u8) {
        let default_filter = match verbose {
            0 => self.config.app.log_level.as_filter(),
            1 => "debug",
            _ => "trace",
        };
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(default_filter),
        )
        .try_init();
    }

    pub fn library_manager(&self) -> Result<LibraryManager> {
        LibraryManager::new(self.config.clone(), self.config_manager.config_dir())
            .context("Failed to open library state")
    }
}

/// Applies root directory flags on top of the loaded config
pub fn apply_flag_overrides(config: &mut Config, matches: &ArgMatches) {
    if let Some(dir) = matches.get_one::<String>("downloads") {
        config.library.downloads_root = PathBuf::from(dir);
    }
    if let Some(dir) = matches.get_one::<String>("library") {
        config.library.library_root = PathBuf::from(dir);
    }
}
