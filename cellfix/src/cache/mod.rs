//! Caching layer between triangulation and the dataset.
//!
//! ```text
//! ┌──────────────────────┐     miss     ┌───────────────────┐
//! │  CellLocationCache   │ ───────────► │ CellLocationSource│
//! │  positive + negative │ ◄─────────── │ (ShardedCellStore)│
//! └──────────┬───────────┘    result    └───────────────────┘
//!            │ stores into
//!            ▼
//! ┌──────────────────────┐
//! │ dyn ResolutionCache  │  Unbounded (default) | Bounded (moka)
//! └──────────────────────┘
//! ```
//!
//! Negative entries are as permanent as positive ones: a cell the dataset
//! does not hold is never searched for again while it stays cached.

mod memory;
mod resolver;
mod traits;

pub use memory::BoundedResolutionCache;
pub use resolver::{CacheStats, CellLocationCache, CellResolver, Resolution};
pub use traits::{CacheEntry, ResolutionCache, UnboundedResolutionCache};
