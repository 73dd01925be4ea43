//! Cell identity model.
//!
//! - [`UniqueCellId`]: the five-field key used by the dataset and caches
//! - [`Coordinates`]: a latitude/longitude pair
//! - [`CellObservation`]: a visible cell plus its relative signal strength
//! - [`RawCellReport`]: what the modem observer reports, before filtering

mod reports;
mod types;

pub use reports::{
    observations_from_reports, read_cell_reports, CellReportError, RadioTechnology,
    RawCellReport, INVALID_VALUE,
};
pub use types::{CellObservation, CellTechnology, Coordinates, UniqueCellId};
