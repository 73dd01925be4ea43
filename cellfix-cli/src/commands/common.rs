//! Argument types and output helpers shared across commands.

use clap::ValueEnum;

use cellfix::cell::CellTechnology;
use cellfix::position::PositionReport;
use cellfix::time::format_timestamp_ms;

/// Radio technology selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TechnologyArg {
    Lte,
    Gsm,
    /// Also used for WCDMA cells
    Umts,
}

impl From<TechnologyArg> for CellTechnology {
    fn from(arg: TechnologyArg) -> Self {
        match arg {
            TechnologyArg::Lte => CellTechnology::Lte,
            TechnologyArg::Gsm => CellTechnology::Gsm,
            TechnologyArg::Umts => CellTechnology::Umts,
        }
    }
}

/// One-line human readable form of a published position.
pub fn describe_position(report: &PositionReport) -> String {
    if report.timestamp == 0 {
        return "no fix".to_string();
    }
    format!(
        "{:.6}, {:.6} ±{:.0}m at {}",
        report.latitude,
        report.longitude,
        report.accuracy.horizontal,
        format_timestamp_ms(report.timestamp * 1000)
    )
}
