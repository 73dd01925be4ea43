//! Cell identity and coordinate value types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Radio access technology of a cell, as stored in the dataset.
///
/// The declaration order matches the numeric tag used by the shard format
/// (`Lte = 0`, `Gsm = 1`, `Umts = 2`), so the derived ordering agrees with
/// the on-disk key ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellTechnology {
    Lte,
    Gsm,
    Umts,
}

impl CellTechnology {
    /// Numeric tag used in shard files.
    pub fn tag(self) -> u16 {
        match self {
            CellTechnology::Lte => 0,
            CellTechnology::Gsm => 1,
            CellTechnology::Umts => 2,
        }
    }

    /// Parse a shard file tag.
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(CellTechnology::Lte),
            1 => Some(CellTechnology::Gsm),
            2 => Some(CellTechnology::Umts),
            _ => None,
        }
    }

    /// Radio type name used by geolocation web services.
    pub fn radio_type(self) -> &'static str {
        match self {
            CellTechnology::Lte => "lte",
            CellTechnology::Gsm => "gsm",
            CellTechnology::Umts => "wcdma",
        }
    }
}

impl fmt::Display for CellTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellTechnology::Lte => "LTE",
            CellTechnology::Gsm => "GSM",
            CellTechnology::Umts => "UMTS",
        };
        f.write_str(name)
    }
}

/// Globally unique identity of one physical cell.
///
/// Equality, hashing and ordering cover all five fields. Two observations
/// with the same five fields refer to the same cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniqueCellId {
    technology: CellTechnology,
    cell_id: u32,
    location_code: u32,
    mcc: u16,
    mnc: u16,
}

impl UniqueCellId {
    /// Create a cell identity.
    ///
    /// `location_code` is the LAC for GSM/UMTS cells and the TAC for LTE cells.
    pub fn new(
        technology: CellTechnology,
        cell_id: u32,
        location_code: u32,
        mcc: u16,
        mnc: u16,
    ) -> Self {
        Self {
            technology,
            cell_id,
            location_code,
            mcc,
            mnc,
        }
    }

    pub fn technology(&self) -> CellTechnology {
        self.technology
    }

    pub fn cell_id(&self) -> u32 {
        self.cell_id
    }

    pub fn location_code(&self) -> u32 {
        self.location_code
    }

    pub fn mcc(&self) -> u16 {
        self.mcc
    }

    pub fn mnc(&self) -> u16 {
        self.mnc
    }

    /// First decimal digit of the location code, which selects the shard.
    pub fn shard_digit(&self) -> char {
        // Leading digit of the base-10 representation; 0 maps to '0'.
        let mut code = self.location_code;
        while code >= 10 {
            code /= 10;
        }
        char::from(b'0' + code as u8)
    }
}

impl fmt::Display for UniqueCellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.technology, self.mcc, self.mnc, self.location_code, self.cell_id
        )
    }
}

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// A currently visible cell with its relative signal strength.
///
/// Observations are regenerated on every cell observer update and never
/// persisted. The strength is a unitless magnitude, not calibrated dBm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellObservation {
    pub cell: UniqueCellId,
    pub signal_strength: u32,
}

impl CellObservation {
    pub fn new(cell: UniqueCellId, signal_strength: u32) -> Self {
        Self {
            cell,
            signal_strength,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technology_tags_round_trip() {
        for tech in [CellTechnology::Lte, CellTechnology::Gsm, CellTechnology::Umts] {
            assert_eq!(CellTechnology::from_tag(tech.tag()), Some(tech));
        }
        assert_eq!(CellTechnology::from_tag(3), None);
    }

    #[test]
    fn test_shard_digit_is_leading_decimal_digit() {
        let id = |lac| UniqueCellId::new(CellTechnology::Gsm, 1, lac, 244, 5);
        assert_eq!(id(0).shard_digit(), '0');
        assert_eq!(id(7).shard_digit(), '7');
        assert_eq!(id(31_245).shard_digit(), '3');
        assert_eq!(id(u32::MAX).shard_digit(), '4');
    }

    #[test]
    fn test_ids_differing_in_any_field_are_distinct() {
        let base = UniqueCellId::new(CellTechnology::Lte, 100, 200, 244, 91);
        assert_ne!(base, UniqueCellId::new(CellTechnology::Gsm, 100, 200, 244, 91));
        assert_ne!(base, UniqueCellId::new(CellTechnology::Lte, 101, 200, 244, 91));
        assert_ne!(base, UniqueCellId::new(CellTechnology::Lte, 100, 201, 244, 91));
        assert_ne!(base, UniqueCellId::new(CellTechnology::Lte, 100, 200, 245, 91));
        assert_ne!(base, UniqueCellId::new(CellTechnology::Lte, 100, 200, 244, 92));
        assert_eq!(base, UniqueCellId::new(CellTechnology::Lte, 100, 200, 244, 91));
    }

    #[test]
    fn test_display_includes_all_fields() {
        let id = UniqueCellId::new(CellTechnology::Umts, 5, 6, 7, 8);
        assert_eq!(id.to_string(), "UMTS:7:8:6:5");
    }
}
