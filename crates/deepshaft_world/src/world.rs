//! # World
//!
//! The single entry point hosts talk to. Owns the chunk store, the collapse
//! simulator and the mining-progress tracker, and keeps their side effects
//! consistent: a tile that becomes empty loses its crack stage and may
//! undermine an unstable neighbour.

use std::ops::RangeInclusive;

use crate::block::{Block, OreSpec};
use crate::chunk::{ChunkCoord, ChunkStore, TilePos, WorldBounds, CHUNK_SIZE};
use crate::collapse::{CollapseSimulator, FallingRock};
use crate::config::WorldConfig;
use crate::error::WorldResult;
use crate::mining::{BlockStateTracker, MiningStage};
use crate::sparse::SparseMap;
use crate::zone::DepthZone;

/// Sub-seed purpose for the collapse RNG.
const COLLAPSE_RNG_PURPOSE: u64 = 0xC011_A95E;

/// Ores the handheld scanner reports.
pub const SCANNABLE_ORES: [Block; 4] = [
    Block::Ruby,
    Block::Sapphire,
    Block::Emerald,
    Block::Mithril,
];

/// Axis-aligned rectangle in physical units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TileRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl TileRect {
    /// Creates a rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[inline]
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A procedurally generated mine shaft.
pub struct World {
    store: ChunkStore,
    collapse: CollapseSimulator,
    states: BlockStateTracker,
}

impl World {
    /// Builds a world and materializes the surface row.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WorldError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn new(config: WorldConfig) -> WorldResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Default world with the given seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::build(WorldConfig::with_seed(seed))
    }

    fn build(config: WorldConfig) -> Self {
        let rng = config.world_seed().derive(COLLAPSE_RNG_PURPOSE).rng();
        let collapse = CollapseSimulator::new(&config, rng);
        let mut store = ChunkStore::new(config);
        store.ensure_depth(0);

        let config = store.config();
        tracing::info!(
            "World created: seed={:#x}, {}x{} tiles, {} zones",
            config.seed,
            config.num_cols,
            config.max_depth,
            config.zones.zones().len()
        );

        Self {
            store,
            collapse,
            states: BlockStateTracker::new(),
        }
    }

    /// Configuration in use.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        self.store.config()
    }

    /// World extent.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> WorldBounds {
        self.store.bounds()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Block at `pos`, generating its chunk if needed. `None` out of bounds.
    pub fn block_at(&mut self, pos: TilePos) -> Option<Block> {
        self.store.block_at(pos)
    }

    /// Block at `pos` without generating anything.
    #[must_use]
    pub fn peek(&self, pos: TilePos) -> Option<Block> {
        self.store.peek(pos)
    }

    /// Crack stage at `pos`.
    #[must_use]
    pub fn get_block_state(&self, pos: TilePos) -> MiningStage {
        self.states.get(pos)
    }

    /// Zone in effect at row `y`.
    #[must_use]
    pub fn get_depth_zone(&self, y: i32) -> &DepthZone {
        self.store.zones().zone_for(y)
    }

    /// Attributes of `block`.
    #[must_use]
    pub fn ore_spec(&self, block: Block) -> &OreSpec {
        self.store.ores().get(block)
    }

    /// Base mining time of the block at `pos`; `None` if absent or empty.
    pub fn mining_time(&mut self, pos: TilePos) -> Option<f32> {
        match self.store.block_at(pos)? {
            Block::Empty => None,
            block => Some(self.store.ores().get(block).mining_time),
        }
    }

    /// Collision rectangles of solid tiles around `rect`.
    ///
    /// Covers the tiles overlapping `rect` plus one tile on every side,
    /// clamped to the shaft.
    pub fn get_surrounding_blocks(&mut self, rect: TileRect) -> Vec<TileRect> {
        let tile_size = self.config().tile_size;
        let bounds = self.bounds();
        let to_tile = |v: f32| (v / tile_size).floor() as i32;

        let left = to_tile(rect.x).saturating_sub(1).max(0);
        let right = to_tile(rect.right()).saturating_add(2).min(bounds.num_cols);
        let top = to_tile(rect.y).saturating_sub(1).max(0);
        let bottom = to_tile(rect.bottom()).saturating_add(2).min(bounds.max_depth);

        let mut solids = Vec::new();
        for ty in top..bottom {
            for tx in left..right {
                if self.store.block_at(TilePos::new(tx, ty)).is_some_and(Block::is_solid) {
                    solids.push(TileRect::new(
                        tx as f32 * tile_size,
                        ty as f32 * tile_size,
                        tile_size,
                        tile_size,
                    ));
                }
            }
        }
        solids
    }

    /// Row of the first grass tile in column `x`, scanning down through
    /// chunks that are already materialized.
    #[must_use]
    pub fn get_surface_y(&self, x: i32) -> Option<i32> {
        let bounds = self.bounds();
        if x < 0 || x >= bounds.num_cols {
            return None;
        }

        let column = TilePos::new(x, 0).chunk().x;
        let mut cy = 0;
        while self.store.is_loaded(ChunkCoord::new(column, cy)) {
            let top = cy * CHUNK_SIZE as i32;
            let found = (top..top + CHUNK_SIZE as i32)
                .find(|&y| self.store.peek(TilePos::new(x, y)) == Some(Block::Grass));
            if found.is_some() {
                return found;
            }
            cy += 1;
        }
        None
    }

    /// Unstable tiles whose collapse timer is running, sorted.
    #[must_use]
    pub fn get_hazard_blocks(&self) -> Vec<TilePos> {
        self.collapse.hazards()
    }

    /// Rare-ore tiles within the square of `radius` tiles around `center`.
    pub fn scan_rare_ores(&mut self, center: TilePos, radius: i32) -> Vec<TilePos> {
        let (xs, ys) = self.clamped_square(center, radius.max(0));
        let mut found = Vec::new();
        for y in ys {
            for x in xs.clone() {
                let pos = TilePos::new(x, y);
                if self
                    .store
                    .block_at(pos)
                    .is_some_and(|block| SCANNABLE_ORES.contains(&block))
                {
                    found.push(pos);
                }
            }
        }
        found
    }

    /// Falling rocks in flight.
    pub fn falling_rocks(&self) -> impl Iterator<Item = &FallingRock> {
        self.collapse.rocks()
    }

    /// Number of falling rocks in flight.
    #[must_use]
    pub fn active_rock_count(&self) -> usize {
        self.collapse.active_rock_count()
    }

    /// Number of materialized chunks.
    #[must_use]
    pub fn loaded_chunk_count(&self) -> usize {
        self.store.loaded_chunk_count()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Writes `block` at `pos`. Returns `false` out of bounds.
    ///
    /// Emptying a tile clears its crack stage and re-checks the stability of
    /// its neighbours; filling one can re-stabilize them.
    pub fn set_block(&mut self, pos: TilePos, block: Block) -> bool {
        if !self.store.set_block(pos, block) {
            return false;
        }
        if block == Block::Empty {
            self.states.clear(pos);
            self.collapse.check_stability(&mut self.store, pos);
        } else {
            self.collapse.recheck_stability(&mut self.store, pos);
        }
        true
    }

    /// Records the crack stage at `pos`. Ignored out of bounds.
    pub fn set_block_state(&mut self, pos: TilePos, stage: MiningStage) {
        if self.bounds().contains(pos) {
            self.states.set(pos, stage);
        }
    }

    /// Puts a rock in flight at physical `(x, y)`. Returns `false` when the
    /// rock pool is exhausted.
    pub fn spawn_falling_rock(&mut self, x: f32, y: f32, velocity: f32, block: Block) -> bool {
        self.collapse.spawn_rock(x, y, velocity, block)
    }

    /// Empties every non-empty tile within `radius` tiles of `center` and
    /// returns what was removed, in row order.
    pub fn blast(&mut self, center: TilePos, radius: f32) -> Vec<(TilePos, Block)> {
        let radius = radius.max(0.0);
        let (xs, ys) = self.clamped_square(center, radius.ceil() as i32);
        let mut removed = Vec::new();
        for y in ys {
            for x in xs.clone() {
                let dx = x as f32 - center.x as f32;
                let dy = y as f32 - center.y as f32;
                if dx.hypot(dy) > radius {
                    continue;
                }
                let pos = TilePos::new(x, y);
                match self.store.block_at(pos) {
                    Some(block) if block.is_solid() => {
                        self.set_block(pos, Block::Empty);
                        removed.push((pos, block));
                    }
                    _ => {}
                }
            }
        }
        tracing::debug!(
            "Blast at ({}, {}) r={} removed {} tiles",
            center.x,
            center.y,
            radius,
            removed.len()
        );
        removed
    }

    /// Column and row ranges of the square of `reach` tiles around `center`,
    /// clipped to the shaft.
    fn clamped_square(
        &self,
        center: TilePos,
        reach: i32,
    ) -> (RangeInclusive<i32>, RangeInclusive<i32>) {
        let bounds = self.bounds();
        let clip = |mid: i32, len: i32| {
            mid.saturating_sub(reach).max(0)..=mid.saturating_add(reach).min(len - 1)
        };
        (clip(center.x, bounds.num_cols), clip(center.y, bounds.max_depth))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Materializes every chunk down to row `depth`. Returns how many chunks
    /// were generated.
    pub fn ensure_depth(&mut self, depth: i32) -> usize {
        let generated = self.store.ensure_depth(depth);
        tracing::info!(
            "Ensured depth {}: {} new chunks, {} loaded",
            depth,
            generated,
            self.store.loaded_chunk_count()
        );
        generated
    }

    /// Advances falling rocks and collapse timers by `dt` seconds. Returns
    /// the ore value of rocks that landed.
    pub fn update(&mut self, dt: f32) -> u64 {
        let tick = self.collapse.update(&mut self.store, dt);
        for pos in &tick.collapsed {
            self.states.clear(*pos);
        }
        tick.value
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Snapshot of every known tile.
    #[must_use]
    pub fn export_sparse_map(&self) -> SparseMap {
        self.store.export_sparse_map()
    }

    /// Replaces the world's tiles with `map`.
    ///
    /// Loaded chunks are rebuilt, crack stages on now-empty tiles are
    /// dropped, timers on tiles that are no longer unstable stop, and rocks
    /// in flight are discarded.
    pub fn load_from_sparse_map(&mut self, map: SparseMap) {
        let entries = map.len();
        self.store.load_from_sparse_map(map);

        let store = &self.store;
        self.states
            .retain(|pos| store.sparse_map().get(pos) != Some(Block::Empty));
        self.collapse
            .retain_timers(|pos| store.sparse_map().get(pos) == Some(Block::Unstable));
        self.collapse.clear_rocks();

        tracing::info!(
            "Loaded sparse map: {} tiles, {} chunks rebuilt",
            entries,
            self.store.loaded_chunk_count()
        );
    }
}
