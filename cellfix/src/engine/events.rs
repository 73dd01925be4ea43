//! Events published by the engine.

use serde::Serialize;

use crate::position::PositionReport;
use crate::status::Status;

/// Provider name reported to clients.
pub const PROVIDER_NAME: &str = "Mlsdb";

/// Provider description reported to clients.
pub const PROVIDER_DESCRIPTION: &str = "Mozilla Location Service Database cell-id position provider";

/// Something clients should hear about.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum EngineEvent {
    PositionChanged(PositionReport),
    StatusChanged(Status),
    /// No client for the idle timeout; the service should exit.
    IdleTimeout,
}

/// Static provider description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub name: &'static str,
    pub description: &'static str,
}

impl Default for ProviderInfo {
    fn default() -> Self {
        Self {
            name: PROVIDER_NAME,
            description: PROVIDER_DESCRIPTION,
        }
    }
}
