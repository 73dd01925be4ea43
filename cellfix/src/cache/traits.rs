//! Storage strategy for cell resolutions.
//!
//! The `ResolutionCache` trait is the seam between the lookup policy in
//! [`CellLocationCache`](super::CellLocationCache) and the map that holds
//! the results. The default strategy never evicts; a bounded strategy is
//! available in [`super::memory`].

use std::collections::HashMap;

use crate::cell::{Coordinates, UniqueCellId};

/// What is remembered about one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheEntry {
    /// The dataset holds this cell.
    Resolved(Coordinates),
    /// The dataset was searched and does not hold this cell.
    Unresolvable,
}

/// Key-value storage for cache entries.
///
/// Implementations decide retention. An entry that is dropped will be
/// probed against the dataset again on its next lookup.
pub trait ResolutionCache: Send + Sync {
    /// Look up a cell.
    fn get(&self, id: &UniqueCellId) -> Option<CacheEntry>;

    /// Remember a cell. Replaces any previous entry.
    fn insert(&mut self, id: UniqueCellId, entry: CacheEntry);

    /// Number of entries currently held.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries, or `None` when unbounded.
    fn capacity(&self) -> Option<u64>;
}

/// Cache that keeps every entry for the life of the process.
///
/// The dataset is static while the process runs, so both positive and
/// negative entries stay valid forever. Growth is bounded only by the
/// number of distinct cells the device sees.
#[derive(Debug, Default)]
pub struct UnboundedResolutionCache {
    entries: HashMap<UniqueCellId, CacheEntry>,
}

impl UnboundedResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResolutionCache for UnboundedResolutionCache {
    fn get(&self, id: &UniqueCellId) -> Option<CacheEntry> {
        self.entries.get(id).copied()
    }

    fn insert(&mut self, id: UniqueCellId, entry: CacheEntry) {
        self.entries.insert(id, entry);
    }

    fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    fn capacity(&self) -> Option<u64> {
        None
    }
}
