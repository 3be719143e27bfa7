//! # Chunk System
//!
//! The shaft is cut into 16x16 tile chunks that are generated the first time
//! any of their tiles is touched and kept for the life of the world.
//!
//! ## Generation passes
//!
//! 1. Vein generation, tile by tile, using the zone of each row.
//! 2. Optional cave, rolled once per chunk from the chunk's own RNG.
//! 3. Hazard pass tagging some deep tiles unstable.
//! 4. Sparse map overlay: recorded tiles win, everything else is recorded.
//!
//! Every random draw is seeded from the world seed and the chunk or tile
//! coordinate, so a chunk comes out the same whenever it is generated.

use std::collections::HashMap;

use rand::Rng;

use crate::block::{Block, OreTable};
use crate::cave::CaveCarver;
use crate::config::WorldConfig;
use crate::noise::WorldSeed;
use crate::sparse::SparseMap;
use crate::vein::VeinGenerator;
use crate::zone::ZoneTable;

/// Chunk width and height in tiles.
pub const CHUNK_SIZE: usize = 16;

const CHUNK_SIZE_I32: i32 = CHUNK_SIZE as i32;

/// Depth over which the hazard chance doubles.
const HAZARD_DEPTH_SCALE: f64 = 10_000.0;

/// Tile coordinate. `y` grows downward from the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TilePos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TilePos {
    /// Creates a tile position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Packs into a single hash key.
    #[inline]
    #[must_use]
    pub const fn pack(self) -> u64 {
        ((self.x as u32 as u64) << 32) | (self.y as u32 as u64)
    }

    /// Inverse of [`TilePos::pack`].
    #[inline]
    #[must_use]
    pub const fn unpack(key: u64) -> Self {
        Self {
            x: (key >> 32) as u32 as i32,
            y: key as u32 as i32,
        }
    }

    /// Chunk containing this tile.
    #[inline]
    #[must_use]
    pub const fn chunk(self) -> ChunkCoord {
        ChunkCoord::from_tile(self)
    }

    /// Offset inside the owning chunk.
    #[inline]
    #[must_use]
    pub const fn local(self) -> (usize, usize) {
        (
            self.x.rem_euclid(CHUNK_SIZE_I32) as usize,
            self.y.rem_euclid(CHUNK_SIZE_I32) as usize,
        )
    }

    /// The tile moved by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Orthogonal neighbours: below, right, left, above.
    #[must_use]
    pub const fn neighbors(self) -> [Self; 4] {
        [
            self.offset(0, 1),
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, -1),
        ]
    }
}

/// Chunk coordinate (in chunks, not tiles).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkCoord {
    /// Chunk column.
    pub x: i32,
    /// Chunk row.
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing `pos`.
    #[inline]
    #[must_use]
    pub const fn from_tile(pos: TilePos) -> Self {
        Self {
            x: pos.x.div_euclid(CHUNK_SIZE_I32),
            y: pos.y.div_euclid(CHUNK_SIZE_I32),
        }
    }

    /// Top-left tile of the chunk.
    #[inline]
    #[must_use]
    pub const fn origin(self) -> TilePos {
        TilePos::new(self.x * CHUNK_SIZE_I32, self.y * CHUNK_SIZE_I32)
    }

    /// Packs into a single hash key.
    #[inline]
    #[must_use]
    pub const fn pack(self) -> u64 {
        TilePos::new(self.x, self.y).pack()
    }

    /// Inverse of [`ChunkCoord::pack`].
    #[inline]
    #[must_use]
    pub const fn unpack(key: u64) -> Self {
        let pos = TilePos::unpack(key);
        Self::new(pos.x, pos.y)
    }
}

/// Extent of the shaft in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldBounds {
    /// Width in tiles.
    pub num_cols: i32,
    /// Depth in tiles.
    pub max_depth: i32,
}

impl WorldBounds {
    /// Creates bounds.
    #[inline]
    #[must_use]
    pub const fn new(num_cols: i32, max_depth: i32) -> Self {
        Self {
            num_cols,
            max_depth,
        }
    }

    /// True when `pos` lies inside the shaft.
    #[inline]
    #[must_use]
    pub const fn contains(self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.x < self.num_cols && pos.y >= 0 && pos.y < self.max_depth
    }

    /// Number of chunk columns needed to cover the width.
    #[inline]
    #[must_use]
    pub const fn chunk_cols(self) -> i32 {
        (self.num_cols + CHUNK_SIZE_I32 - 1) / CHUNK_SIZE_I32
    }
}

/// A 16x16 block of tiles. Cells outside the world are `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    coord: ChunkCoord,
    /// Indexed as `[y][x]`.
    cells: [[Option<Block>; CHUNK_SIZE]; CHUNK_SIZE],
}

impl Chunk {
    /// Creates a chunk whose in-bounds cells are empty.
    #[must_use]
    pub fn new(coord: ChunkCoord, bounds: WorldBounds) -> Self {
        let mut cells = [[None; CHUNK_SIZE]; CHUNK_SIZE];
        let origin = coord.origin();
        for (ly, row) in cells.iter_mut().enumerate() {
            for (lx, cell) in row.iter_mut().enumerate() {
                if bounds.contains(origin.offset(lx as i32, ly as i32)) {
                    *cell = Some(Block::Empty);
                }
            }
        }
        Self { coord, cells }
    }

    /// Chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Block at local `(lx, ly)`.
    #[inline]
    #[must_use]
    pub fn get(&self, lx: usize, ly: usize) -> Option<Block> {
        self.cells.get(ly).and_then(|row| row.get(lx)).copied().flatten()
    }

    /// Writes an in-bounds cell. Returns `false` (and does nothing) for
    /// cells outside the world.
    #[inline]
    pub fn set(&mut self, lx: usize, ly: usize, block: Block) -> bool {
        match self.cells.get_mut(ly).and_then(|row| row.get_mut(lx)) {
            Some(cell) if cell.is_some() => {
                *cell = Some(block);
                true
            }
            _ => false,
        }
    }

    /// Block at world position `pos`, if `pos` lies in this chunk.
    #[must_use]
    pub fn get_tile(&self, pos: TilePos) -> Option<Block> {
        if pos.chunk() != self.coord {
            return None;
        }
        let (lx, ly) = pos.local();
        self.get(lx, ly)
    }

    /// World position of local `(lx, ly)`.
    #[inline]
    #[must_use]
    pub const fn tile_pos(&self, lx: usize, ly: usize) -> TilePos {
        self.coord.origin().offset(lx as i32, ly as i32)
    }
}

/// Lazily generated chunks over an authoritative [`SparseMap`].
pub struct ChunkStore {
    config: WorldConfig,
    bounds: WorldBounds,
    seed: WorldSeed,
    veins: VeinGenerator,
    carver: CaveCarver,
    chunks: HashMap<u64, Chunk>,
    map: SparseMap,
}

impl ChunkStore {
    /// Creates an empty store. Nothing is generated yet.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let seed = config.world_seed();
        Self {
            bounds: WorldBounds::new(config.num_cols, config.max_depth),
            seed,
            veins: VeinGenerator::new(seed),
            carver: CaveCarver::new(config.wall_chance, config.treasure_chance),
            chunks: HashMap::new(),
            map: SparseMap::new(),
            config,
        }
    }

    /// Configuration the store was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// World extent.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Depth zones in use.
    #[inline]
    #[must_use]
    pub fn zones(&self) -> &ZoneTable {
        &self.config.zones
    }

    /// Ore attributes in use.
    #[inline]
    #[must_use]
    pub fn ores(&self) -> &OreTable {
        &self.config.ores
    }

    /// Block at `pos`, generating its chunk if needed. `None` out of bounds.
    pub fn block_at(&mut self, pos: TilePos) -> Option<Block> {
        if !self.bounds.contains(pos) {
            return None;
        }
        let (lx, ly) = pos.local();
        self.chunk_mut(pos.chunk()).get(lx, ly)
    }

    /// Block at `pos` if its chunk is already materialized.
    #[must_use]
    pub fn peek(&self, pos: TilePos) -> Option<Block> {
        if !self.bounds.contains(pos) {
            return None;
        }
        let (lx, ly) = pos.local();
        self.chunks.get(&pos.chunk().pack())?.get(lx, ly)
    }

    /// Writes `block` at `pos` into the chunk and the sparse map.
    ///
    /// Returns `false` without doing anything when `pos` is out of bounds.
    pub fn set_block(&mut self, pos: TilePos, block: Block) -> bool {
        if !self.bounds.contains(pos) {
            return false;
        }
        let (lx, ly) = pos.local();
        self.chunk_mut(pos.chunk()).set(lx, ly, block);
        self.map.insert(pos, block);
        true
    }

    /// True if `coord` has been materialized.
    #[inline]
    #[must_use]
    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord.pack())
    }

    /// Number of materialized chunks.
    #[inline]
    #[must_use]
    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Materialized chunk at `coord`.
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord.pack())
    }

    /// Generates (or regenerates) the chunk at `coord`.
    ///
    /// Tiles recorded in the sparse map keep their recorded value, so
    /// regenerating never undoes an edit.
    pub fn generate_chunk(&mut self, coord: ChunkCoord) -> &Chunk {
        let mut chunk = Chunk::new(coord, self.bounds);
        let origin = coord.origin();

        for ly in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                let pos = chunk.tile_pos(lx, ly);
                if self.bounds.contains(pos) {
                    let zone = self.config.zones.zone_for(pos.y);
                    chunk.set(lx, ly, self.veins.generate(pos, zone, &self.config.ores));
                }
            }
        }

        let mut rng = self.seed.for_chunk(coord.x, coord.y).rng();

        let top_zone = self.config.zones.zone_for(origin.y);
        if origin.y > self.config.cave_floor && rng.gen::<f64>() < top_zone.cave_chance {
            let report = self.carver.carve(&mut chunk, top_zone, &mut rng);
            tracing::debug!(
                "Carved cave in chunk ({}, {}): {} carved, {} walls, treasure {:?}",
                coord.x,
                coord.y,
                report.carved,
                report.walls,
                report.treasure
            );
        }

        let mut hazards = 0usize;
        for ly in 0..CHUNK_SIZE {
            let y = origin.y + ly as i32;
            if y <= self.config.hazard_floor {
                continue;
            }
            let chance = self.config.zones.zone_for(y).hazard_chance
                * (1.0 + f64::from(y) / HAZARD_DEPTH_SCALE);
            for lx in 0..CHUNK_SIZE {
                if matches!(chunk.get(lx, ly), Some(b) if b.is_solid())
                    && rng.gen::<f64>() < chance
                {
                    chunk.set(lx, ly, Block::Unstable);
                    hazards += 1;
                }
            }
        }

        for ly in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                let Some(generated) = chunk.get(lx, ly) else {
                    continue;
                };
                let pos = chunk.tile_pos(lx, ly);
                match self.map.get(pos) {
                    Some(recorded) => {
                        chunk.set(lx, ly, recorded);
                    }
                    None => {
                        self.map.insert(pos, generated);
                    }
                }
            }
        }

        tracing::debug!(
            "Generated chunk ({}, {}) with {} hazards",
            coord.x,
            coord.y,
            hazards
        );

        let key = coord.pack();
        self.chunks.insert(key, chunk);
        &self.chunks[&key]
    }

    /// Materializes every chunk from the surface down to row `depth`
    /// (clamped to the shaft). Returns how many chunks were newly generated.
    pub fn ensure_depth(&mut self, depth: i32) -> usize {
        let target = depth.min(self.bounds.max_depth - 1);
        if target < 0 {
            return 0;
        }

        let last_row = target.div_euclid(CHUNK_SIZE_I32);
        let mut generated = 0;
        for cy in 0..=last_row {
            for cx in 0..self.bounds.chunk_cols() {
                let coord = ChunkCoord::new(cx, cy);
                if !self.is_loaded(coord) {
                    self.generate_chunk(coord);
                    generated += 1;
                }
            }
        }
        generated
    }

    /// Copy of the authoritative sparse map.
    #[must_use]
    pub fn export_sparse_map(&self) -> SparseMap {
        self.map.clone()
    }

    /// The authoritative sparse map.
    #[inline]
    #[must_use]
    pub fn sparse_map(&self) -> &SparseMap {
        &self.map
    }

    /// Replaces the sparse map and rebuilds every chunk that was loaded.
    ///
    /// Entries outside the world are dropped. Tiles the new map does not
    /// mention are generated again from the seed.
    pub fn load_from_sparse_map(&mut self, mut map: SparseMap) {
        let bounds = self.bounds;
        map.retain(|pos, _| bounds.contains(pos));

        let mut known: Vec<ChunkCoord> =
            self.chunks.keys().map(|&key| ChunkCoord::unpack(key)).collect();
        known.sort_unstable();

        self.map = map;
        self.chunks.clear();
        for coord in known {
            self.generate_chunk(coord);
        }
    }

    fn chunk_mut(&mut self, coord: ChunkCoord) -> &mut Chunk {
        let key = coord.pack();
        if !self.chunks.contains_key(&key) {
            self.generate_chunk(coord);
        }
        let bounds = self.bounds;
        self.chunks
            .entry(key)
            .or_insert_with(|| Chunk::new(coord, bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_store(seed: u64) -> ChunkStore {
        ChunkStore::new(WorldConfig {
            num_cols: 40,
            max_depth: 400,
            ..WorldConfig::with_seed(seed)
        })
    }

    #[test]
    fn test_pack_roundtrip() {
        for pos in [
            TilePos::new(0, 0),
            TilePos::new(-1, 5),
            TilePos::new(99, -7),
            TilePos::new(i32::MAX, i32::MIN),
        ] {
            assert_eq!(TilePos::unpack(pos.pack()), pos);
        }
        let coord = ChunkCoord::new(-3, 12);
        assert_eq!(ChunkCoord::unpack(coord.pack()), coord);
    }

    #[test]
    fn test_chunk_coord_math() {
        assert_eq!(TilePos::new(17, 5).chunk(), ChunkCoord::new(1, 0));
        assert_eq!(TilePos::new(-1, 16).chunk(), ChunkCoord::new(-1, 1));
        assert_eq!(TilePos::new(-1, 16).local(), (15, 0));
        assert_eq!(ChunkCoord::new(2, 3).origin(), TilePos::new(32, 48));
    }

    #[test]
    fn test_chunk_cols_rounds_up() {
        assert_eq!(WorldBounds::new(10, 20).chunk_cols(), 1);
        assert_eq!(WorldBounds::new(16, 20).chunk_cols(), 1);
        assert_eq!(WorldBounds::new(17, 20).chunk_cols(), 2);
        assert_eq!(WorldBounds::new(100, 20).chunk_cols(), 7);
    }

    #[test]
    fn test_chunk_marks_out_of_bounds_cells() {
        let chunk = Chunk::new(ChunkCoord::new(0, 1), WorldBounds::new(10, 20));
        assert_eq!(chunk.get(9, 3), Some(Block::Empty));
        assert_eq!(chunk.get(10, 3), None);
        assert_eq!(chunk.get(0, 4), None);
        assert_eq!(chunk.get(99, 0), None);
    }

    #[test]
    fn test_block_at_generates_lazily() {
        let mut store = small_store(1);
        assert_eq!(store.loaded_chunk_count(), 0);
        assert_eq!(store.peek(TilePos::new(3, 3)), None);

        assert_eq!(store.block_at(TilePos::new(3, 0)), Some(Block::Grass));
        assert!(store.is_loaded(ChunkCoord::new(0, 0)));
        assert_eq!(store.loaded_chunk_count(), 1);
        assert!(store.peek(TilePos::new(3, 3)).is_some());
    }

    #[test]
    fn test_out_of_bounds() {
        let mut store = small_store(1);
        assert_eq!(store.block_at(TilePos::new(-1, 0)), None);
        assert_eq!(store.block_at(TilePos::new(40, 0)), None);
        assert_eq!(store.block_at(TilePos::new(0, 400)), None);
        assert!(!store.set_block(TilePos::new(0, -1), Block::Stone));
        assert_eq!(store.loaded_chunk_count(), 0);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let mut a = small_store(42);
        let mut b = small_store(42);
        a.ensure_depth(200);
        b.ensure_depth(200);
        assert_eq!(a.export_sparse_map(), b.export_sparse_map());
    }

    #[test]
    fn test_generation_order_does_not_matter() {
        let mut forward = small_store(8);
        let mut scattered = small_store(8);
        forward.ensure_depth(100);
        for cy in (0..=6).rev() {
            for cx in (0..3).rev() {
                scattered.generate_chunk(ChunkCoord::new(cx, cy));
            }
        }
        assert_eq!(forward.export_sparse_map(), scattered.export_sparse_map());
    }

    #[test]
    fn test_every_materialized_tile_is_recorded() {
        let mut store = small_store(5);
        store.ensure_depth(63);
        // 3 chunk columns cover 40 tiles; 4 chunk rows cover 64 rows.
        assert_eq!(store.loaded_chunk_count(), 12);
        assert_eq!(store.sparse_map().len(), 40 * 64);
        for (pos, block) in store.sparse_map().iter() {
            assert_eq!(store.peek(pos), Some(block));
        }
    }

    #[test]
    fn test_ensure_depth_counts_new_chunks() {
        let mut store = small_store(5);
        assert_eq!(store.ensure_depth(15), 3);
        assert_eq!(store.ensure_depth(15), 0);
        assert_eq!(store.ensure_depth(16), 3);
        assert_eq!(store.ensure_depth(-4), 0);
        // Clamped to the last row of the shaft (row 399, chunk row 24).
        store.ensure_depth(i32::MAX);
        assert_eq!(store.loaded_chunk_count(), 25 * 3);
    }

    #[test]
    fn test_no_hazards_above_floor() {
        let mut store = small_store(3);
        store.ensure_depth(50);
        for (pos, block) in store.sparse_map().iter() {
            if pos.y <= 50 {
                assert_ne!(block, Block::Unstable, "{pos:?}");
            }
        }
    }

    #[test]
    fn test_regeneration_keeps_edits() {
        let mut store = small_store(9);
        let pos = TilePos::new(7, 30);
        assert!(store.set_block(pos, Block::Diamond));
        store.generate_chunk(pos.chunk());
        assert_eq!(store.block_at(pos), Some(Block::Diamond));
    }

    #[test]
    fn test_load_rebuilds_known_chunks() {
        let mut store = small_store(12);
        store.ensure_depth(40);
        let mut snapshot = store.export_sparse_map();
        snapshot.insert(TilePos::new(2, 2), Block::Gold);
        snapshot.insert(TilePos::new(5000, 2), Block::Gold);
        snapshot.remove(TilePos::new(3, 3));

        let before = store.loaded_chunk_count();
        let original_3_3 = store.peek(TilePos::new(3, 3));
        store.load_from_sparse_map(snapshot);

        assert_eq!(store.loaded_chunk_count(), before);
        assert_eq!(store.peek(TilePos::new(2, 2)), Some(Block::Gold));
        // Forgotten tiles come back from the generator.
        assert_eq!(store.peek(TilePos::new(3, 3)), original_3_3);
        assert_eq!(store.sparse_map().get(TilePos::new(5000, 2)), None);
    }
}
