//! Composition of sessions, scheduling, fallback and status.
//!
//! ```text
//!  add_reference ──► SessionRegistry ──► start/stop positioning
//!                                              │
//!  timers ───────► PositionScheduler ──recompute──► FallbackCoordinator
//!                         ▲                          │ online │ offline
//!                         │                          ▼        ▼
//!                         │                HttpLocator   triangulation
//!                         │                          │        │
//!                         └──── supersede ◄──────────┴────────┘
//!                                   │
//!                                   ▼
//!                         publish ──► StatusMachine ──► EngineEvent
//! ```
//!
//! The engine is synchronous. The service loop in [`crate::service`] owns
//! it and feeds it commands, timer expiries and online results.

mod config;
mod events;
mod machine;

pub use config::{EngineConfig, DEFAULT_EVENT_CAPACITY, DEFAULT_ONLINE_TIMEOUT};
pub use events::{EngineEvent, ProviderInfo, PROVIDER_DESCRIPTION, PROVIDER_NAME};
pub use machine::PositionEngine;
