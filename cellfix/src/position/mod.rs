//! Location fixes and their published form.

use std::fmt;

use serde::Serialize;

use crate::time::format_timestamp_ms;

/// Accuracy level reported with every fix (postal code granularity).
pub const ACCURACY_LEVEL_POSTALCODE: i32 = 4;

/// Horizontal and vertical accuracy in meters. NaN means unknown.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Accuracy {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for Accuracy {
    fn default() -> Self {
        Self {
            horizontal: f64::NAN,
            vertical: f64::NAN,
        }
    }
}

impl Accuracy {
    pub fn horizontal(meters: f64) -> Self {
        Self {
            horizontal: meters,
            vertical: f64::NAN,
        }
    }

    pub fn level(&self) -> i32 {
        ACCURACY_LEVEL_POSTALCODE
    }
}

/// A timestamped position estimate.
///
/// A zero timestamp means "no fix"; such a value is still published, e.g.
/// when positioning is disabled.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LocationFix {
    pub timestamp_ms: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy: Accuracy,
}

impl Default for LocationFix {
    fn default() -> Self {
        Self::none()
    }
}

impl LocationFix {
    /// The "no fix" value.
    pub fn none() -> Self {
        Self {
            timestamp_ms: 0,
            latitude: f64::NAN,
            longitude: f64::NAN,
            altitude: f64::NAN,
            accuracy: Accuracy::default(),
        }
    }

    /// A fix without altitude.
    pub fn new(timestamp_ms: u64, latitude: f64, longitude: f64, horizontal_accuracy: f64) -> Self {
        Self {
            timestamp_ms,
            latitude,
            longitude,
            altitude: f64::NAN,
            accuracy: Accuracy::horizontal(horizontal_accuracy),
        }
    }

    /// True when this carries an actual position.
    pub fn is_valid(&self) -> bool {
        self.timestamp_ms != 0
    }

    /// Milliseconds elapsed since the fix was taken.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp_ms)
    }
}

impl fmt::Display for LocationFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return f.write_str("no fix");
        }
        write!(
            f,
            "{:.6},{:.6} ±{:.0}m at {}",
            self.latitude,
            self.longitude,
            self.accuracy.horizontal,
            format_timestamp_ms(self.timestamp_ms)
        )
    }
}

/// Which position fields carry values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PositionFields(u32);

impl PositionFields {
    pub const NONE: PositionFields = PositionFields(0);
    pub const LATITUDE: PositionFields = PositionFields(1 << 0);
    pub const LONGITUDE: PositionFields = PositionFields(1 << 1);
    pub const ALTITUDE: PositionFields = PositionFields(1 << 2);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: PositionFields) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for PositionFields {
    type Output = PositionFields;

    fn bitor(self, rhs: Self) -> Self {
        PositionFields(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for PositionFields {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Published accuracy: level plus meters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AccuracyReport {
    pub level: i32,
    pub horizontal: f64,
    pub vertical: f64,
}

/// A fix in the shape clients receive it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PositionReport {
    pub fields: PositionFields,
    /// Whole seconds since the Unix epoch; zero when there is no fix.
    pub timestamp: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy: AccuracyReport,
}

impl From<&LocationFix> for PositionReport {
    fn from(fix: &LocationFix) -> Self {
        let mut fields = PositionFields::NONE;
        if !fix.latitude.is_nan() {
            fields |= PositionFields::LATITUDE;
        }
        if !fix.longitude.is_nan() {
            fields |= PositionFields::LONGITUDE;
        }
        if !fix.altitude.is_nan() {
            fields |= PositionFields::ALTITUDE;
        }

        Self {
            fields,
            timestamp: fix.timestamp_ms / 1000,
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            accuracy: AccuracyReport {
                level: fix.accuracy.level(),
                horizontal: fix.accuracy.horizontal,
                vertical: fix.accuracy.vertical,
            },
        }
    }
}

impl From<LocationFix> for PositionReport {
    fn from(fix: LocationFix) -> Self {
        PositionReport::from(&fix)
    }
}
