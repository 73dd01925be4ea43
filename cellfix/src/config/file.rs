//! Daemon configuration file (~/.cellfix/config.ini).
//!
//! Every key is optional; missing keys keep their defaults. Parsing lives
//! in [`super::parser`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::dataset::{DEFAULT_DATASET_ROOT, DEFAULT_SHARD_FILE_NAME};
use crate::engine::EngineConfig;
use crate::scheduler::SchedulerConfig;
use crate::settings::DEFAULT_SETTINGS_PATH;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSection {
    pub roots: Vec<PathBuf>,
    pub file_name: String,
}

impl Default for DatasetSection {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(DEFAULT_DATASET_ROOT)],
            file_name: DEFAULT_SHARD_FILE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsSection {
    pub path: PathBuf,
    pub poll_interval: Duration,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SETTINGS_PATH),
            poll_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnlineSection {
    /// Geolocate endpoint. Online positioning is unavailable when unset.
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

impl Default for OnlineSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSection {
    /// Bound on cached cells. Unbounded when unset.
    pub max_entries: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggingSection {
    /// Also log to this file.
    pub file: Option<PathBuf>,
}

/// Parsed daemon configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub dataset: DatasetSection,
    pub settings: SettingsSection,
    pub timers: SchedulerConfig,
    pub online: OnlineSection,
    pub cache: CacheSection,
    pub logging: LoggingSection,
}

impl ConfigFile {
    /// Load from the default path.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_scheduler(self.timers)
            .with_online_timeout(self.online.timeout)
    }
}

/// The configuration directory (~/.cellfix).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cellfix")
}

/// The configuration file path (~/.cellfix/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("config.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.dataset.file_name, "mlsdb.data");
        assert_eq!(config.online.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_config_path_under_home() {
        assert!(config_file_path().ends_with(".cellfix/config.ini"));
    }

    #[test]
    fn test_engine_config_carries_timers() {
        let mut config = ConfigFile::default();
        config.timers.idle_timeout = Duration::from_secs(5);
        config.online.timeout = Duration::from_secs(3);
        let engine = config.engine_config();
        assert_eq!(engine.scheduler.idle_timeout, Duration::from_secs(5));
        assert_eq!(engine.online_timeout, Duration::from_secs(3));
    }
}
