//! Locator and dispatch seams.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use super::query::LocationQuery;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Position returned by an online locator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnlineFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in meters.
    pub accuracy: f64,
}

/// Why an online lookup failed. Every variant sends the engine down the
/// offline path.
#[derive(Debug, Error)]
pub enum OnlineError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Locator returned HTTP {0}")]
    Status(u16),

    #[error("Invalid locator response: {0}")]
    Decode(String),

    #[error("Online lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("Locator has no position for these observations")]
    NotFound,
}

/// One lookup: the current query plus the one before it.
#[derive(Debug, Clone)]
pub struct LocateRequest {
    pub query: LocationQuery,
    pub previous: Option<LocationQuery>,
}

/// Resolves observations to a position over the network.
///
/// Uses [`BoxFuture`] so it can be held as `Arc<dyn OnlineLocator>`.
pub trait OnlineLocator: Send + Sync {
    fn locate(&self, request: LocateRequest) -> BoxFuture<'_, Result<OnlineFix, OnlineError>>;
}

/// Fires an online lookup without waiting for it.
///
/// The result must come back to the engine as
/// `online_result(generation, result)`.
pub trait OnlineDispatch: Send {
    fn dispatch(&self, generation: u64, request: LocateRequest);
}
