//! Tokio service around the engine.
//!
//! ```text
//!   PositionHandle ──Command──┐
//!   SettingsWatcher ──────────┤
//!   JsonCellObserver ─────────┤            ┌────────────────┐
//!   TokioDispatcher ──result──┴──► mpsc ──►│ PositionService│──► broadcast<EngineEvent>
//!          ▲                               │  (one task)    │
//!          └────────── dispatch ───────────│ PositionEngine │
//!                                          └────────────────┘
//! ```
//!
//! All engine work happens on the service task. Online lookups are the
//! only work done elsewhere; their results re-enter through the same
//! channel as every other notification.

mod dispatch;
mod handle;
mod observer;
mod runner;

use std::sync::Arc;

pub use handle::{PositionHandle, ServiceError};
pub use observer::JsonCellObserver;
pub use runner::{ExitReason, PositionService};

use crate::cache::BoundedResolutionCache;
use crate::config::ConfigFile;
use crate::dataset::{CellLocationSource, ShardedCellStore};
use crate::engine::PositionEngine;
use crate::online::{HttpLocator, OnlineError, OnlineLocator};
use crate::settings::SettingsSnapshot;
use crate::time::Clock;

/// Build the dataset store described by the configuration.
pub fn store_from_config(config: &ConfigFile) -> ShardedCellStore {
    ShardedCellStore::new(config.dataset.roots.clone()).with_file_name(&config.dataset.file_name)
}

/// Build an engine from the daemon configuration and initial settings.
pub fn engine_from_config(
    config: &ConfigFile,
    settings: SettingsSnapshot,
    clock: Arc<dyn Clock>,
) -> PositionEngine {
    let source: Arc<dyn CellLocationSource> = Arc::new(store_from_config(config));
    let engine = PositionEngine::new(config.engine_config(), source, clock).with_settings(settings);
    match config.cache.max_entries {
        Some(max) => engine.with_cache_strategy(Box::new(BoundedResolutionCache::new(max))),
        None => engine,
    }
}

/// Build the online locator, if an endpoint is configured.
pub fn locator_from_config(
    config: &ConfigFile,
) -> Result<Option<Arc<dyn OnlineLocator>>, OnlineError> {
    match &config.online.endpoint {
        Some(endpoint) => {
            let locator = HttpLocator::new(endpoint.clone(), config.online.timeout)?;
            Ok(Some(Arc::new(locator)))
        }
        None => Ok(None),
    }
}
