//! CLI command implementations.
//!
//! - [`run`] - Position service with event printing
//! - [`lookup`] - Single cell lookup
//! - [`estimate`] - Offline triangulation of a cell list
//! - [`dataset`] - Shard file packing
//! - [`settings`] - Effective settings dump

pub mod common;
pub mod dataset;
pub mod estimate;
pub mod lookup;
pub mod run;
pub mod settings;
