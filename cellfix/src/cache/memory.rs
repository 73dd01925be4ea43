//! Capacity-bounded resolution cache using moka.
//!
//! Moka evicts by a TinyLFU admission policy once `max_entries` is reached.
//! Evicted cells are simply looked up on disk again, so choosing this
//! strategy trades the "one probe per cell" property for bounded memory.

use moka::sync::Cache;

use super::traits::{CacheEntry, ResolutionCache};
use crate::cell::UniqueCellId;

/// Resolution cache holding at most `max_entries` cells.
pub struct BoundedResolutionCache {
    cache: Cache<UniqueCellId, CacheEntry>,
    max_entries: u64,
}

impl BoundedResolutionCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_entries).build(),
            max_entries,
        }
    }
}

impl ResolutionCache for BoundedResolutionCache {
    fn get(&self, id: &UniqueCellId) -> Option<CacheEntry> {
        self.cache.get(id)
    }

    fn insert(&mut self, id: UniqueCellId, entry: CacheEntry) {
        self.cache.insert(id, entry);
        // Apply pending evictions so `len` reflects the bound.
        self.cache.run_pending_tasks();
    }

    fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    fn capacity(&self) -> Option<u64> {
        Some(self.max_entries)
    }
}

impl std::fmt::Debug for BoundedResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedResolutionCache")
            .field("entries", &self.cache.entry_count())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}
