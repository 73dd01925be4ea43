//! Online (network-based) positioning.
//!
//! - [`LocationQuery`]: observations sent to the locator
//! - [`OnlineLocator`]: async request/response seam, [`HttpLocator`] implements it
//! - [`OnlineDispatch`]: fire-and-forget seam the engine calls
//! - [`InFlightGuard`]: one query at a time, tagged with a generation

mod http;
mod inflight;
mod locator;
mod query;

pub use http::HttpLocator;
pub use inflight::InFlightGuard;
pub use locator::{BoxFuture, LocateRequest, OnlineDispatch, OnlineError, OnlineFix, OnlineLocator};
pub use query::{LocationQuery, WlanObservation};
