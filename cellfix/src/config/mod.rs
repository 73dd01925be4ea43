//! Daemon configuration.
//!
//! ```ini
//! [dataset]
//! roots = /usr/share/geoclue-provider-mlsdb/
//! file_name = mlsdb.data
//!
//! [settings]
//! path = /etc/location/location.conf
//! poll_interval_secs = 5
//!
//! [timers]
//! idle_timeout_secs = 30
//! fix_lost_timeout_secs = 30
//! minimum_interval_secs = 10
//! reuse_window_secs = 30
//! fallback_window_secs = 120
//!
//! [online]
//! endpoint = https://location.services.example/v1/geolocate
//! timeout_secs = 15
//!
//! [cache]
//! max_entries = 100000
//!
//! [logging]
//! file = ~/.cellfix/cellfix.log
//! ```

mod file;
mod parser;

pub use file::{
    config_directory, config_file_path, CacheSection, ConfigFile, ConfigFileError,
    DatasetSection, LoggingSection, OnlineSection, SettingsSection,
};
