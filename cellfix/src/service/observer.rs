//! File-backed cell observer.
//!
//! Stands in for the modem: a JSON file holding an array of
//! [`RawCellReport`]s is polled and every changed list is pushed to the
//! service.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::handle::PositionHandle;
use crate::cell::{read_cell_reports, CellReportError, RawCellReport};

pub struct JsonCellObserver {
    path: PathBuf,
    poll_interval: Duration,
    last_modified: Option<SystemTime>,
    last_reports: Option<Vec<RawCellReport>>,
}

impl JsonCellObserver {
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            poll_interval,
            last_modified: None,
            last_reports: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file if it changed. Returns the new list only when its
    /// contents differ from the last one returned.
    pub fn poll(&mut self) -> Result<Option<Vec<RawCellReport>>, CellReportError> {
        let modified = std::fs::metadata(&self.path)?.modified()?;
        if self.last_modified == Some(modified) {
            return Ok(None);
        }
        self.last_modified = Some(modified);

        let reports = read_cell_reports(&self.path)?;
        if self.last_reports.as_ref() == Some(&reports) {
            return Ok(None);
        }
        self.last_reports = Some(reports.clone());
        Ok(Some(reports))
    }

    /// Poll until cancelled or the service goes away.
    pub async fn run(mut self, handle: PositionHandle, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            match self.poll() {
                Ok(Some(reports)) => {
                    debug!(path = %self.path.display(), cells = reports.len(), "Cell reports changed");
                    if handle.cells_changed(reports).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to read cell reports"),
            }
        }
    }
}
