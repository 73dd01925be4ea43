//! cellfix - cell-id position determination engine
//!
//! Estimates a device position from the mobile network cells it can see,
//! using an on-disk dataset of cell locations and an optional online
//! locator, and serves it to long-lived, low-power location clients.
//!
//! The layers, leaves first:
//!
//! - [`cell`]: cell identities and raw observer reports
//! - [`dataset`]: sharded binary dataset of cell locations
//! - [`cache`]: positive/negative lookup cache
//! - [`triangulation`]: signal-strength weighted position estimate
//! - [`online`] / [`fallback`]: online lookup with offline fallback
//! - [`scheduler`], [`session`], [`status`]: recompute policy, clients, availability
//! - [`engine`]: the composed state machine
//! - [`service`]: tokio event loop and handle

pub mod cache;
pub mod cell;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod fallback;
pub mod logging;
pub mod online;
pub mod position;
pub mod scheduler;
pub mod service;
pub mod session;
pub mod settings;
pub mod status;
pub mod time;
pub mod triangulation;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
