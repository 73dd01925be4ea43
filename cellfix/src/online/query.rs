//! Online location queries.

use serde::{Deserialize, Serialize};

use crate::cell::CellObservation;

/// A visible WLAN access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WlanObservation {
    /// MAC address, e.g. `01:23:45:67:89:ab`.
    pub bssid: String,
    /// Signal strength in dBm.
    pub signal_strength_dbm: i32,
}

impl WlanObservation {
    pub fn new(bssid: impl Into<String>, signal_strength_dbm: i32) -> Self {
        Self {
            bssid: bssid.into(),
            signal_strength_dbm,
        }
    }
}

/// Everything an online locator gets to see.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationQuery {
    pub created_at_ms: u64,
    pub cells: Vec<CellObservation>,
    pub wlans: Vec<WlanObservation>,
}

impl LocationQuery {
    /// Build a query from the current observations.
    ///
    /// WLAN observations are left out unless `wlan_allowed`. Returns `None`
    /// when the query would carry no observations.
    pub fn build(
        created_at_ms: u64,
        cells: &[CellObservation],
        wlans: &[WlanObservation],
        wlan_allowed: bool,
    ) -> Option<Self> {
        let wlans = if wlan_allowed { wlans.to_vec() } else { Vec::new() };
        if cells.is_empty() && wlans.is_empty() {
            return None;
        }
        Some(Self {
            created_at_ms,
            cells: cells.to_vec(),
            wlans,
        })
    }

    pub fn observation_count(&self) -> usize {
        self.cells.len() + self.wlans.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellTechnology, UniqueCellId};

    fn cells() -> Vec<CellObservation> {
        vec![CellObservation::new(
            UniqueCellId::new(CellTechnology::Gsm, 1, 2, 244, 5),
            10,
        )]
    }

    #[test]
    fn test_empty_query_is_not_built() {
        assert!(LocationQuery::build(1, &[], &[], true).is_none());
        let wlans = vec![WlanObservation::new("00:11:22:33:44:55", -60)];
        assert!(LocationQuery::build(1, &[], &wlans, false).is_none());
    }

    #[test]
    fn test_wlan_only_included_when_allowed() {
        let wlans = vec![WlanObservation::new("00:11:22:33:44:55", -60)];
        let allowed = LocationQuery::build(1, &cells(), &wlans, true).unwrap();
        assert_eq!(allowed.observation_count(), 2);

        let denied = LocationQuery::build(1, &cells(), &wlans, false).unwrap();
        assert!(denied.wlans.is_empty());
        assert_eq!(denied.cells.len(), 1);
    }
}
