//! Building shard files from plain entries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::format::{encode_shard, ShardMap, DEFAULT_SHARD_FILE_NAME};
use super::DatasetError;
use crate::cell::{CellTechnology, Coordinates, UniqueCellId};

/// One dataset row in its interchange form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub tech: CellTechnology,
    pub cid: u32,
    pub lac: u32,
    pub mcc: u16,
    pub mnc: u16,
    pub lat: f64,
    pub lon: f64,
}

impl DatasetEntry {
    pub fn cell(&self) -> UniqueCellId {
        UniqueCellId::new(self.tech, self.cid, self.lac, self.mcc, self.mnc)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Groups cells by shard digit and writes one file per digit.
#[derive(Debug, Default)]
pub struct ShardWriter {
    shards: BTreeMap<char, ShardMap>,
    file_name: Option<String>,
}

impl ShardWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Add a cell. A later insert of the same cell replaces the earlier one.
    pub fn insert(&mut self, cell: UniqueCellId, coords: Coordinates) {
        self.shards
            .entry(cell.shard_digit())
            .or_default()
            .insert(cell, coords);
    }

    pub fn extend<'a>(&mut self, entries: impl IntoIterator<Item = &'a DatasetEntry>) {
        for entry in entries {
            self.insert(entry.cell(), entry.coordinates());
        }
    }

    /// Total number of cells across all shards.
    pub fn len(&self) -> usize {
        self.shards.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write `<dir>/<digit>/<file name>` for every populated digit.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
        let file_name = self
            .file_name
            .as_deref()
            .unwrap_or(DEFAULT_SHARD_FILE_NAME);

        let mut written = Vec::with_capacity(self.shards.len());
        for (digit, shard) in &self.shards {
            let shard_dir = dir.join(digit.to_string());
            std::fs::create_dir_all(&shard_dir)?;
            let path = shard_dir.join(file_name);
            std::fs::write(&path, encode_shard(shard))?;
            info!(path = %path.display(), cells = shard.len(), "Wrote dataset shard");
            written.push(path);
        }
        Ok(written)
    }
}

/// Read a JSON array of [`DatasetEntry`]s.
pub fn read_entries(path: &Path) -> Result<Vec<DatasetEntry>, DatasetError> {
    let data = std::fs::read(path)?;
    serde_json::from_slice(&data).map_err(DatasetError::Entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::decode_shard;
    use tempfile::TempDir;

    #[test]
    fn test_writes_one_file_per_digit() {
        let dir = TempDir::new().unwrap();
        let entries = vec![
            DatasetEntry { tech: CellTechnology::Gsm, cid: 1, lac: 1000, mcc: 244, mnc: 5, lat: 1.0, lon: 2.0 },
            DatasetEntry { tech: CellTechnology::Umts, cid: 2, lac: 1999, mcc: 244, mnc: 5, lat: 3.0, lon: 4.0 },
            DatasetEntry { tech: CellTechnology::Lte, cid: 3, lac: 9, mcc: 244, mnc: 91, lat: 5.0, lon: 6.0 },
        ];

        let mut writer = ShardWriter::new();
        writer.extend(&entries);
        assert_eq!(writer.len(), 3);

        let files = writer.write_to(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(dir.path().join("1").join("mlsdb.data").is_file());
        assert!(dir.path().join("9").join("mlsdb.data").is_file());

        let ones = decode_shard(&std::fs::read(&files[0]).unwrap()).unwrap();
        assert_eq!(ones.len(), 2);
        assert_eq!(ones.get(&entries[1].cell()), Some(&Coordinates::new(3.0, 4.0)));
    }

    #[test]
    fn test_reads_entries_from_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cells.json");
        std::fs::write(
            &path,
            r#"[{"tech": "lte", "cid": 42, "lac": 7000, "mcc": 244, "mnc": 91, "lat": 60.1, "lon": 24.9}]"#,
        )
        .unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tech, CellTechnology::Lte);
        assert_eq!(entries[0].cell().shard_digit(), '7');
    }
}
