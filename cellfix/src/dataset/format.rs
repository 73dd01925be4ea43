//! Shard file encoding.
//!
//! Every shard file is a single big-endian serialized mapping:
//!
//! ```text
//! +-----------+-------------+-------------+-----------------------------+
//! | magic u32 | version i32 | count u32   | count x (key, value)        |
//! +-----------+-------------+-------------+-----------------------------+
//! key   = tech u16, cell id u32, location code u32, mcc u16, mnc u16
//! value = latitude f64, longitude f64
//! ```

use std::collections::BTreeMap;

use bytes::{Buf, BufMut, BytesMut};

use super::DatasetError;
use crate::cell::{CellTechnology, Coordinates, UniqueCellId};

/// Magic number at the start of every shard file.
pub const SHARD_MAGIC: u32 = 0x0C71_0CDB;

/// The only supported format version.
pub const SHARD_VERSION: i32 = 3;

/// Default shard file name inside a digit directory.
pub const DEFAULT_SHARD_FILE_NAME: &str = "mlsdb.data";

const HEADER_LEN: usize = 4 + 4 + 4;
const ENTRY_LEN: usize = 2 + 4 + 4 + 2 + 2 + 8 + 8;

/// Decoded contents of one shard file.
pub type ShardMap = BTreeMap<UniqueCellId, Coordinates>;

fn ensure(buf: &impl Buf, needed: usize) -> Result<(), DatasetError> {
    if buf.remaining() < needed {
        Err(DatasetError::Truncated {
            needed,
            remaining: buf.remaining(),
        })
    } else {
        Ok(())
    }
}

/// Check the header and return the declared entry count.
pub fn decode_header(buf: &mut impl Buf) -> Result<u32, DatasetError> {
    ensure(buf, HEADER_LEN)?;
    let magic = buf.get_u32();
    if magic != SHARD_MAGIC {
        return Err(DatasetError::BadMagic {
            found: magic,
            expected: SHARD_MAGIC,
        });
    }
    let version = buf.get_i32();
    if version != SHARD_VERSION {
        return Err(DatasetError::UnsupportedVersion(version));
    }
    Ok(buf.get_u32())
}

/// Decode a complete shard file.
pub fn decode_shard(data: &[u8]) -> Result<ShardMap, DatasetError> {
    let mut buf = data;
    let count = decode_header(&mut buf)?;

    let mut map = ShardMap::new();
    for _ in 0..count {
        ensure(&buf, ENTRY_LEN)?;
        let tag = buf.get_u16();
        let technology =
            CellTechnology::from_tag(tag).ok_or(DatasetError::UnknownTechnology(tag))?;
        let cell_id = buf.get_u32();
        let location_code = buf.get_u32();
        let mcc = buf.get_u16();
        let mnc = buf.get_u16();
        let latitude = buf.get_f64();
        let longitude = buf.get_f64();

        map.insert(
            UniqueCellId::new(technology, cell_id, location_code, mcc, mnc),
            Coordinates::new(latitude, longitude),
        );
    }

    if buf.has_remaining() {
        return Err(DatasetError::TrailingBytes(buf.remaining()));
    }
    Ok(map)
}

/// Encode a shard mapping into file contents.
pub fn encode_shard(map: &ShardMap) -> BytesMut {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + map.len() * ENTRY_LEN);
    buf.put_u32(SHARD_MAGIC);
    buf.put_i32(SHARD_VERSION);
    buf.put_u32(map.len() as u32);
    for (id, coords) in map {
        buf.put_u16(id.technology().tag());
        buf.put_u32(id.cell_id());
        buf.put_u32(id.location_code());
        buf.put_u16(id.mcc());
        buf.put_u16(id.mnc());
        buf.put_f64(coords.latitude);
        buf.put_f64(coords.longitude);
    }
    buf
}
