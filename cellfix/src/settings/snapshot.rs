//! Settings values and the policy derived from them.

use serde::Serialize;

/// Raw values as stored in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingsSnapshot {
    pub enabled: bool,
    pub mls_enabled: bool,
    /// Deprecated alias for `mls_enabled`.
    pub cell_id_positioning_enabled: bool,
    pub mls_online_enabled: bool,
    pub online_allowed: bool,
    pub cell_data_allowed: bool,
    pub wlan_data_allowed: bool,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            enabled: false,
            mls_enabled: false,
            cell_id_positioning_enabled: false,
            mls_online_enabled: false,
            online_allowed: true,
            cell_data_allowed: true,
            wlan_data_allowed: true,
        }
    }
}

impl SettingsSnapshot {
    /// Everything switched on, for tests and tools.
    pub fn all_enabled() -> Self {
        Self {
            enabled: true,
            mls_enabled: true,
            cell_id_positioning_enabled: false,
            mls_online_enabled: true,
            online_allowed: true,
            cell_data_allowed: true,
            wlan_data_allowed: true,
        }
    }
}

/// Effective engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EngineSettings {
    pub positioning_enabled: bool,
    pub cell_positioning_enabled: bool,
    pub online_positioning_enabled: bool,
    pub online_data_allowed: bool,
    pub cell_data_allowed: bool,
    pub wlan_data_allowed: bool,
}

impl EngineSettings {
    pub fn from_snapshot(snapshot: &SettingsSnapshot) -> Self {
        let cell = snapshot.mls_enabled || snapshot.cell_id_positioning_enabled;
        Self {
            positioning_enabled: snapshot.enabled,
            cell_positioning_enabled: cell,
            // online is a sub-feature of cell-id positioning
            online_positioning_enabled: cell && snapshot.mls_online_enabled,
            online_data_allowed: snapshot.online_allowed,
            cell_data_allowed: snapshot.cell_data_allowed,
            wlan_data_allowed: snapshot.wlan_data_allowed,
        }
    }

    /// Whether the engine should be producing fixes at all.
    pub fn positioning_active(&self) -> bool {
        self.positioning_enabled && self.cell_positioning_enabled
    }

    /// Whether recomputes should try the online locator first.
    pub fn online_active(&self) -> bool {
        self.cell_positioning_enabled && self.online_positioning_enabled && self.online_data_allowed
    }
}

impl From<SettingsSnapshot> for EngineSettings {
    fn from(snapshot: SettingsSnapshot) -> Self {
        Self::from_snapshot(&snapshot)
    }
}
