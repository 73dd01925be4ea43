//! Raw cell reports from the modem and their conversion to observations.
//!
//! The cell observer reports every neighbour cell it can see, including
//! cells without a usable identity (e.g. LTE neighbours that only carry a
//! physical cell id). [`observations_from_reports`] keeps the cells that can
//! be looked up in the dataset and drops duplicates.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::types::{CellObservation, CellTechnology, UniqueCellId};

/// Sentinel the modem uses for "value not available".
pub const INVALID_VALUE: i32 = i32::MAX;

fn invalid_value() -> i32 {
    INVALID_VALUE
}

/// Radio technology as reported by the modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadioTechnology {
    Gsm,
    Wcdma,
    Lte,
    #[serde(other)]
    Unknown,
}

impl From<RadioTechnology> for CellTechnology {
    fn from(radio: RadioTechnology) -> Self {
        match radio {
            RadioTechnology::Lte => CellTechnology::Lte,
            RadioTechnology::Gsm => CellTechnology::Gsm,
            // WCDMA and anything unrecognised are looked up as UMTS cells.
            RadioTechnology::Wcdma | RadioTechnology::Unknown => CellTechnology::Umts,
        }
    }
}

/// One cell exactly as the observer reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCellReport {
    pub technology: RadioTechnology,
    #[serde(default)]
    pub mcc: u16,
    #[serde(default)]
    pub mnc: u16,
    #[serde(default = "invalid_value")]
    pub lac: i32,
    #[serde(default = "invalid_value")]
    pub cid: i32,
    #[serde(default = "invalid_value")]
    pub tac: i32,
    #[serde(default = "invalid_value")]
    pub ci: i32,
    #[serde(default)]
    pub signal_strength: u32,
}

impl RawCellReport {
    /// A GSM/UMTS style report identified by LAC and CID.
    pub fn with_lac_cid(
        technology: RadioTechnology,
        mcc: u16,
        mnc: u16,
        lac: i32,
        cid: i32,
        signal_strength: u32,
    ) -> Self {
        Self {
            technology,
            mcc,
            mnc,
            lac,
            cid,
            tac: INVALID_VALUE,
            ci: INVALID_VALUE,
            signal_strength,
        }
    }

    /// An LTE style report identified by TAC and CI.
    pub fn with_tac_ci(mcc: u16, mnc: u16, tac: i32, ci: i32, signal_strength: u32) -> Self {
        Self {
            technology: RadioTechnology::Lte,
            mcc,
            mnc,
            lac: INVALID_VALUE,
            cid: INVALID_VALUE,
            tac,
            ci,
            signal_strength,
        }
    }

    /// Derive the dataset identity of this cell, if it has one.
    ///
    /// CID/LAC wins over CI/TAC. A cell needs a non-zero MCC and a valid,
    /// non-zero cell id to be usable. Ids and location codes are taken as
    /// their unsigned bit pattern, so negative values never collapse onto
    /// a real code.
    pub fn unique_id(&self) -> Option<UniqueCellId> {
        if self.mcc == 0 {
            return None;
        }
        let (cell_id, location_code) = if is_valid_id(self.cid) {
            (self.cid, self.lac)
        } else if is_valid_id(self.ci) {
            (self.ci, self.tac)
        } else {
            return None;
        };
        Some(UniqueCellId::new(
            self.technology.into(),
            cell_id as u32,
            location_code as u32,
            self.mcc,
            self.mnc,
        ))
    }
}

fn is_valid_id(value: i32) -> bool {
    value != INVALID_VALUE && value != 0
}

/// Convert raw observer reports into deduplicated observations.
///
/// Reports without a usable identity are dropped with a diagnostic. When the
/// same cell is reported twice the first report wins.
pub fn observations_from_reports(reports: &[RawCellReport]) -> Vec<CellObservation> {
    let mut seen = HashSet::new();
    let mut observations = Vec::with_capacity(reports.len());

    for report in reports {
        let Some(cell) = report.unique_id() else {
            debug!(
                technology = ?report.technology,
                mcc = report.mcc,
                mnc = report.mnc,
                lac = report.lac,
                tac = report.tac,
                "Ignoring neighbour cell with no cell id"
            );
            continue;
        };
        if seen.insert(cell) {
            debug!(cell = %cell, strength = report.signal_strength, "Have neighbour cell");
            observations.push(CellObservation::new(cell, report.signal_strength));
        }
    }

    observations
}

/// Errors reading a cell report file.
#[derive(Debug, Error)]
pub enum CellReportError {
    #[error("Failed to read cell reports: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cell report JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read a JSON array of [`RawCellReport`]s from a file.
pub fn read_cell_reports(path: &Path) -> Result<Vec<RawCellReport>, CellReportError> {
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}
