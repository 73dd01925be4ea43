//! On-demand lookups against sharded dataset files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::MatchOptions;
use tracing::debug;

use super::format::{decode_shard, ShardMap, DEFAULT_SHARD_FILE_NAME};
use super::DatasetError;
use crate::cell::{Coordinates, UniqueCellId};

/// Default install location of the dataset.
pub const DEFAULT_DATASET_ROOT: &str = "/usr/share/geoclue-provider-mlsdb/";

/// Something that can answer "where is this cell?".
///
/// Implementations do no caching of their own. A miss is a normal outcome.
pub trait CellLocationSource: Send + Sync {
    fn find(&self, id: &UniqueCellId) -> Option<Coordinates>;
}

impl<T: CellLocationSource + ?Sized> CellLocationSource for Arc<T> {
    fn find(&self, id: &UniqueCellId) -> Option<Coordinates> {
        (**self).find(id)
    }
}

/// Dataset spread over shard files selected by the first digit of the
/// location code.
///
/// A lookup for a cell whose location code starts with `3` reads every file
/// matching `<root>/**/3/<file name>` under each root. Files that cannot be
/// read or decoded are skipped. The first file containing the cell wins.
#[derive(Debug, Clone)]
pub struct ShardedCellStore {
    roots: Vec<PathBuf>,
    file_name: String,
}

impl Default for ShardedCellStore {
    fn default() -> Self {
        Self::new(vec![PathBuf::from(DEFAULT_DATASET_ROOT)])
    }
}

impl ShardedCellStore {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            file_name: DEFAULT_SHARD_FILE_NAME.to_string(),
        }
    }

    /// Override the shard file name (defaults to `mlsdb.data`).
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// All shard files for the given leading digit, across every root.
    pub fn shard_files(&self, digit: char) -> Result<Vec<PathBuf>, DatasetError> {
        let options = MatchOptions {
            case_sensitive: false,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        let mut files = Vec::new();
        for root in &self.roots {
            let root = root.to_string_lossy();
            let pattern = format!(
                "{}/**/{}/*",
                glob::Pattern::escape(root.trim_end_matches('/')),
                digit,
            );
            for entry in glob::glob_with(&pattern, options)? {
                match entry {
                    Ok(path) if path.is_file() && self.is_shard_name(&path) => files.push(path),
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, "Unable to inspect dataset path"),
                }
            }
        }
        Ok(files)
    }

    // Literal glob components bypass `case_sensitive`, so the file name is
    // compared here instead.
    fn is_shard_name(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.eq_ignore_ascii_case(&self.file_name))
    }

    /// Read and decode one shard file.
    pub fn load_shard(path: &Path) -> Result<ShardMap, DatasetError> {
        let data = std::fs::read(path)?;
        decode_shard(&data)
    }
}

impl CellLocationSource for ShardedCellStore {
    fn find(&self, id: &UniqueCellId) -> Option<Coordinates> {
        let digit = id.shard_digit();
        let files = match self.shard_files(digit) {
            Ok(files) => files,
            Err(e) => {
                debug!(error = %e, "Invalid dataset search pattern");
                return None;
            }
        };

        if files.is_empty() {
            debug!(digit = %digit, "No dataset files for shard");
        }

        for path in files {
            let shard = match Self::load_shard(&path) {
                Ok(shard) => shard,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping dataset file");
                    continue;
                }
            };
            if shard.is_empty() {
                debug!(path = %path.display(), "Dataset file holds no cells");
                continue;
            }
            if let Some(coords) = shard.get(id) {
                debug!(cell = %id, path = %path.display(), location = %coords, "Found cell");
                return Some(*coords);
            }
        }

        debug!(cell = %id, "Cell not in dataset");
        None
    }
}
