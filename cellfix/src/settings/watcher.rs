//! Polling watcher for the settings file.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::loader::load_settings;
use super::snapshot::SettingsSnapshot;

type Stamp = (Option<SystemTime>, Option<SystemTime>);

/// Watches the settings file and its directory by modification time.
///
/// The directory is watched too so that the file appearing, disappearing or
/// being replaced atomically is noticed.
#[derive(Debug)]
pub struct SettingsWatcher {
    path: PathBuf,
    poll_interval: Duration,
    last: Stamp,
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl SettingsWatcher {
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        let path = path.into();
        let last = Self::stamp(&path);
        Self {
            path,
            poll_interval,
            last,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn stamp(path: &Path) -> Stamp {
        let dir = path.parent().and_then(modified);
        (modified(path), dir)
    }

    /// True when the file or directory changed since the last poll.
    pub fn poll_changed(&mut self) -> bool {
        let stamp = Self::stamp(&self.path);
        if stamp != self.last {
            self.last = stamp;
            true
        } else {
            false
        }
    }

    /// Poll until cancelled, calling `on_change` with every fresh snapshot.
    pub async fn run<F>(mut self, cancel: CancellationToken, mut on_change: F)
    where
        F: FnMut(SettingsSnapshot),
    {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        debug!(path = %self.path.display(), "Watching settings");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            if !self.poll_changed() {
                continue;
            }
            match load_settings(&self.path) {
                Ok(snapshot) => {
                    info!(path = %self.path.display(), "Settings changed");
                    on_change(snapshot);
                }
                Err(e) => warn!(error = %e, "Failed to reload settings"),
            }
        }
    }
}
