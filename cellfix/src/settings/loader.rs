//! Reading the location settings file.

use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption, Properties};
use thiserror::Error;

use super::snapshot::SettingsSnapshot;

/// Default location of the system settings file.
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/location/location.conf";

const SECTION: &str = "location";

/// Settings file could not be read.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },
}

/// Load a settings snapshot. A missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<SettingsSnapshot, SettingsError> {
    if !path.exists() {
        return Ok(SettingsSnapshot::default());
    }

    // Keys contain literal backslashes (`mls\enabled`), so escapes are off.
    let options = ParseOption {
        enabled_escape: false,
        ..Default::default()
    };
    let ini = Ini::load_from_file_opt(path, options).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match ini.section(Some(SECTION)) {
        Some(props) => snapshot_from(props),
        None => SettingsSnapshot::default(),
    })
}

fn snapshot_from(props: &Properties) -> SettingsSnapshot {
    let defaults = SettingsSnapshot::default();
    let flag = |key: &str, default: bool| lookup(props, key).map_or(default, parse_bool);

    SettingsSnapshot {
        enabled: flag("enabled", defaults.enabled),
        mls_enabled: flag("mls\\enabled", defaults.mls_enabled),
        cell_id_positioning_enabled: flag(
            "cell_id_positioning_enabled",
            defaults.cell_id_positioning_enabled,
        ),
        mls_online_enabled: flag("mls\\online_enabled", defaults.mls_online_enabled),
        online_allowed: flag("allowed_data_sources\\online", defaults.online_allowed),
        cell_data_allowed: flag("allowed_data_sources\\cell_data", defaults.cell_data_allowed),
        wlan_data_allowed: flag("allowed_data_sources\\wlan_data", defaults.wlan_data_allowed),
    }
}

/// Find a key written either as `group\key` or `group/key`.
fn lookup<'a>(props: &'a Properties, key: &str) -> Option<&'a str> {
    props
        .get(key)
        .or_else(|| props.get(key.replace('\\', "/").as_str()))
}

/// Qt-style string to bool: empty, `0` and `false` are false.
fn parse_bool(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}
