//! Shared setup for CLI commands.
//!
//! Loads the daemon configuration and installs logging once, so each
//! command handler starts from the same state.

use std::path::Path;

use tracing::info;

use cellfix::config::{config_file_path, ConfigFile};
use cellfix::dataset::ShardedCellStore;
use cellfix::logging::{init_logging, LoggingGuard, LoggingOptions};
use cellfix::service::store_from_config;
use cellfix::settings::{load_settings, SettingsSnapshot};

use crate::error::CliError;

/// Configuration plus the logging guard for the lifetime of a command.
pub struct CliRunner {
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load the config (defaults when the file is missing) and start logging.
    pub fn new(config_path: Option<&Path>, verbose: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load_from(&config_file_path())?,
        };

        let options = LoggingOptions {
            verbose,
            file: config.logging.file.clone(),
        };
        let logging_guard = init_logging(&options).map_err(CliError::LoggingInit)?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!("cellfix v{}", cellfix::VERSION);
        info!(command, "Running command");
    }

    /// Dataset store from the configured roots.
    pub fn store(&self) -> ShardedCellStore {
        store_from_config(&self.config)
    }

    /// Current location settings from the configured settings file.
    pub fn settings(&self) -> Result<SettingsSnapshot, CliError> {
        Ok(load_settings(&self.config.settings.path)?)
    }
}
