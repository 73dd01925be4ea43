//! Sharded on-disk cell location dataset.
//!
//! The dataset maps [`UniqueCellId`](crate::cell::UniqueCellId)s to
//! coordinates. It is split into shard files by the first decimal digit of
//! the location code, so a lookup only has to read the files for one digit:
//!
//! ```text
//! /usr/share/geoclue-provider-mlsdb/
//! ├── fi/
//! │   ├── 1/mlsdb.data
//! │   └── 3/mlsdb.data
//! └── se/
//!     └── 3/mlsdb.data
//! ```
//!
//! The store never caches; see [`crate::cache`] for that.

mod format;
mod store;
mod writer;

use thiserror::Error;

pub use format::{
    decode_header, decode_shard, encode_shard, ShardMap, DEFAULT_SHARD_FILE_NAME, SHARD_MAGIC,
    SHARD_VERSION,
};
pub use store::{CellLocationSource, ShardedCellStore, DEFAULT_DATASET_ROOT};
pub use writer::{read_entries, DatasetEntry, ShardWriter};

/// Errors reading or writing dataset files.
///
/// Lookups never surface these; a file that fails to load is skipped.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad magic number {found:#010x} (expected {expected:#010x})")]
    BadMagic { found: u32, expected: u32 },

    #[error("Unsupported format version {0}")]
    UnsupportedVersion(i32),

    #[error("Truncated data: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Unknown cell technology tag {0}")]
    UnknownTechnology(u16),

    #[error("{0} trailing bytes after last entry")]
    TrailingBytes(usize),

    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Invalid dataset entries: {0}")]
    Entries(serde_json::Error),
}
