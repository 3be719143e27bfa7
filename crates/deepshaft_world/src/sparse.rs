//! # Sparse Map
//!
//! The authoritative record of every tile the world has ever produced or
//! been told about. Chunks are a cache over this map plus the generator.
//!
//! ## Formats
//!
//! - serde: a map of `"x,y"` keys to block names, e.g. `"3,7" = "coal"`.
//! - binary: sorted 12-byte little-endian records, LZ4 compressed with the
//!   uncompressed size prepended.

use std::collections::{BTreeMap, HashMap};

use bytemuck::{Pod, Zeroable};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::chunk::TilePos;
use crate::error::{WorldError, WorldResult};

/// One tile in the binary snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct TileRecord {
    x: i32,
    y: i32,
    block: u8,
    pad: [u8; 3],
}

const RECORD_SIZE: usize = std::mem::size_of::<TileRecord>();

/// Map from tile position to block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Block>", into = "BTreeMap<String, Block>")]
pub struct SparseMap {
    tiles: HashMap<u64, Block>,
}

impl SparseMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded tiles.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True when nothing is recorded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Recorded block at `pos`.
    #[inline]
    #[must_use]
    pub fn get(&self, pos: TilePos) -> Option<Block> {
        self.tiles.get(&pos.pack()).copied()
    }

    /// Records `block` at `pos`, returning the previous entry.
    pub fn insert(&mut self, pos: TilePos, block: Block) -> Option<Block> {
        self.tiles.insert(pos.pack(), block)
    }

    /// Forgets `pos`, returning the previous entry.
    pub fn remove(&mut self, pos: TilePos) -> Option<Block> {
        self.tiles.remove(&pos.pack())
    }

    /// Keeps only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(TilePos, Block) -> bool) {
        self.tiles.retain(|&key, &mut block| keep(TilePos::unpack(key), block));
    }

    /// Iterates entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (TilePos, Block)> + '_ {
        self.tiles
            .iter()
            .map(|(&key, &block)| (TilePos::unpack(key), block))
    }

    /// All entries sorted by position.
    #[must_use]
    pub fn sorted_entries(&self) -> Vec<(TilePos, Block)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by_key(|&(pos, _)| pos);
        entries
    }

    /// Parses a `"x,y"` key.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidCoordinate`] if the key is not two
    /// comma-separated integers.
    pub fn parse_key(key: &str) -> WorldResult<TilePos> {
        let invalid = || WorldError::InvalidCoordinate(key.to_owned());
        let (x, y) = key.split_once(',').ok_or_else(invalid)?;
        let x = x.trim().parse().map_err(|_| invalid())?;
        let y = y.trim().parse().map_err(|_| invalid())?;
        Ok(TilePos::new(x, y))
    }

    /// Formats `pos` as a `"x,y"` key.
    #[must_use]
    pub fn format_key(pos: TilePos) -> String {
        format!("{},{}", pos.x, pos.y)
    }

    /// Encodes the map as an LZ4-compressed snapshot.
    #[must_use]
    pub fn to_compressed_bytes(&self) -> Vec<u8> {
        let records: Vec<TileRecord> = self
            .sorted_entries()
            .into_iter()
            .map(|(pos, block)| TileRecord {
                x: pos.x.to_le(),
                y: pos.y.to_le(),
                block: block.to_u8(),
                pad: [0; 3],
            })
            .collect();

        compress_prepend_size(bytemuck::cast_slice(&records))
    }

    /// Decodes a snapshot produced by [`SparseMap::to_compressed_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CorruptSnapshot`] if decompression fails or the
    /// payload is not a whole number of records, and
    /// [`WorldError::UnknownBlock`] for an unrecognized block id.
    pub fn from_compressed_bytes(bytes: &[u8]) -> WorldResult<Self> {
        let raw = decompress_size_prepended(bytes)
            .map_err(|e| WorldError::CorruptSnapshot(e.to_string()))?;

        if raw.len() % RECORD_SIZE != 0 {
            return Err(WorldError::CorruptSnapshot(format!(
                "payload of {} bytes is not a multiple of {RECORD_SIZE}",
                raw.len()
            )));
        }

        let mut map = Self::new();
        for chunk in raw.chunks_exact(RECORD_SIZE) {
            // Decompressed buffers carry no alignment guarantee.
            let record: TileRecord = bytemuck::pod_read_unaligned(chunk);
            let block = Block::from_u8(record.block)
                .ok_or_else(|| WorldError::UnknownBlock(format!("id {}", record.block)))?;
            map.insert(
                TilePos::new(i32::from_le(record.x), i32::from_le(record.y)),
                block,
            );
        }
        Ok(map)
    }
}

impl FromIterator<(TilePos, Block)> for SparseMap {
    fn from_iter<I: IntoIterator<Item = (TilePos, Block)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (pos, block) in iter {
            map.insert(pos, block);
        }
        map
    }
}

impl TryFrom<BTreeMap<String, Block>> for SparseMap {
    type Error = WorldError;

    fn try_from(entries: BTreeMap<String, Block>) -> WorldResult<Self> {
        let mut map = Self::new();
        for (key, block) in entries {
            map.insert(Self::parse_key(&key)?, block);
        }
        Ok(map)
    }
}

impl From<SparseMap> for BTreeMap<String, Block> {
    fn from(map: SparseMap) -> Self {
        map.iter()
            .map(|(pos, block)| (SparseMap::format_key(pos), block))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SparseMap {
        [
            (TilePos::new(0, 0), Block::Grass),
            (TilePos::new(3, 7), Block::Coal),
            (TilePos::new(-2, 40), Block::Empty),
            (TilePos::new(9, 1), Block::CrystalWall),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_record_layout() {
        assert_eq!(RECORD_SIZE, 12);
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(SparseMap::parse_key("3,7"), Ok(TilePos::new(3, 7)));
        assert_eq!(SparseMap::parse_key(" -1 , 12 "), Ok(TilePos::new(-1, 12)));
        for bad in ["", "3", "3;7", "a,b", "1,2,3"] {
            assert_eq!(
                SparseMap::parse_key(bad),
                Err(WorldError::InvalidCoordinate(bad.to_owned())),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_toml_form() {
        let text = toml::to_string(&sample()).unwrap();
        assert!(text.contains("\"3,7\" = \"coal\""), "{text}");

        let back: SparseMap = toml::from_str(&text).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_toml_rejects_bad_entries() {
        assert!(toml::from_str::<SparseMap>("\"1-2\" = \"stone\"").is_err());
        assert!(toml::from_str::<SparseMap>("\"1,2\" = \"lava\"").is_err());
    }

    #[test]
    fn test_compressed_snapshot() {
        let map = sample();
        let bytes = map.to_compressed_bytes();
        assert_eq!(SparseMap::from_compressed_bytes(&bytes), Ok(map));

        let empty = SparseMap::new().to_compressed_bytes();
        assert!(SparseMap::from_compressed_bytes(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_compressed_snapshot_is_order_independent() {
        let forward: SparseMap = (0..50).map(|i| (TilePos::new(i, i * 2), Block::Stone)).collect();
        let backward: SparseMap = (0..50)
            .rev()
            .map(|i| (TilePos::new(i, i * 2), Block::Stone))
            .collect();
        assert_eq!(forward.to_compressed_bytes(), backward.to_compressed_bytes());
    }

    #[test]
    fn test_corrupt_snapshot() {
        assert!(matches!(
            SparseMap::from_compressed_bytes(&[1, 2, 3]),
            Err(WorldError::CorruptSnapshot(_))
        ));

        let truncated = compress_prepend_size(&[0u8; RECORD_SIZE + 1]);
        assert!(matches!(
            SparseMap::from_compressed_bytes(&truncated),
            Err(WorldError::CorruptSnapshot(_))
        ));

        let bad_block = TileRecord {
            x: 0,
            y: 0,
            block: 200,
            pad: [0; 3],
        };
        let bytes = compress_prepend_size(bytemuck::bytes_of(&bad_block));
        assert!(matches!(
            SparseMap::from_compressed_bytes(&bytes),
            Err(WorldError::UnknownBlock(_))
        ));
    }
}
