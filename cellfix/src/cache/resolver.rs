//! Positive/negative caching in front of a [`CellLocationSource`].

use std::fmt;

use tracing::debug;

use super::traits::{CacheEntry, ResolutionCache, UnboundedResolutionCache};
use crate::cell::{Coordinates, UniqueCellId};
use crate::dataset::CellLocationSource;

/// Outcome of resolving one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Resolved(Coordinates),
    Unresolvable,
}

impl Resolution {
    pub fn coordinates(self) -> Option<Coordinates> {
        match self {
            Resolution::Resolved(coords) => Some(coords),
            Resolution::Unresolvable => None,
        }
    }
}

impl From<CacheEntry> for Resolution {
    fn from(entry: CacheEntry) -> Self {
        match entry {
            CacheEntry::Resolved(coords) => Resolution::Resolved(coords),
            CacheEntry::Unresolvable => Resolution::Unresolvable,
        }
    }
}

/// Counters for cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered by a positive entry.
    pub positive_hits: u64,
    /// Lookups answered by a negative entry.
    pub negative_hits: u64,
    /// Lookups that had to search the dataset.
    pub probes: u64,
    /// Entries currently held.
    pub entries: u64,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.positive_hits + self.negative_hits + self.probes
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            (self.positive_hits + self.negative_hits) as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries, {} positive hits, {} negative hits, {} probes ({:.1}% hit rate)",
            self.entries,
            self.positive_hits,
            self.negative_hits,
            self.probes,
            self.hit_rate() * 100.0
        )
    }
}

/// Resolves cells to coordinates.
///
/// Takes `&mut self` because resolving may populate a cache.
pub trait CellResolver {
    fn resolve(&mut self, id: &UniqueCellId) -> Resolution;
}

/// Cell lookups with a positive cache and a permanent negative cache.
///
/// With the default strategy each distinct cell is searched for on disk at
/// most once per process lifetime. There is no invalidation.
pub struct CellLocationCache<S> {
    source: S,
    entries: Box<dyn ResolutionCache>,
    stats: CacheStats,
}

impl<S: CellLocationSource> CellLocationCache<S> {
    /// Wrap a source with the default, never-evicting strategy.
    pub fn new(source: S) -> Self {
        Self::with_strategy(source, Box::new(UnboundedResolutionCache::new()))
    }

    /// Wrap a source with a caller-chosen storage strategy.
    pub fn with_strategy(source: S, entries: Box<dyn ResolutionCache>) -> Self {
        Self {
            source,
            entries,
            stats: CacheStats::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ..self.stats
        }
    }

    /// Resolve a cell, consulting the dataset only on a cache miss.
    pub fn resolve(&mut self, id: &UniqueCellId) -> Resolution {
        match self.entries.get(id) {
            Some(CacheEntry::Resolved(coords)) => {
                self.stats.positive_hits += 1;
                return Resolution::Resolved(coords);
            }
            Some(CacheEntry::Unresolvable) => {
                self.stats.negative_hits += 1;
                return Resolution::Unresolvable;
            }
            None => {}
        }

        self.stats.probes += 1;
        let entry = match self.source.find(id) {
            Some(coords) => CacheEntry::Resolved(coords),
            None => {
                debug!(cell = %id, "Caching cell as unresolvable");
                CacheEntry::Unresolvable
            }
        };
        self.entries.insert(*id, entry);
        entry.into()
    }
}

impl<S: CellLocationSource> CellResolver for CellLocationCache<S> {
    fn resolve(&mut self, id: &UniqueCellId) -> Resolution {
        CellLocationCache::resolve(self, id)
    }
}
