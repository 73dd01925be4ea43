//! Location settings.
//!
//! The settings file is owned by the system settings UI. It is re-read in
//! full whenever it changes and turned into an immutable
//! [`SettingsSnapshot`]; [`EngineSettings`] derives the policy from it.
//!
//! ```ini
//! [location]
//! enabled=true
//! mls\enabled=true
//! mls\online_enabled=false
//! allowed_data_sources\online=true
//! allowed_data_sources\cell_data=true
//! allowed_data_sources\wlan_data=true
//! ```

mod loader;
mod snapshot;
mod watcher;

pub use loader::{load_settings, SettingsError, DEFAULT_SETTINGS_PATH};
pub use snapshot::{EngineSettings, SettingsSnapshot};
pub use watcher::SettingsWatcher;
