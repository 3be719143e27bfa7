//! # Ore Vein Generation
//!
//! Picks the block for a single tile. Two sources are blended:
//!
//! - a smooth simplex field, so neighbouring tiles tend to agree and ore
//!   clusters into veins;
//! - one fresh draw from a per-tile RNG, so veins have ragged edges.
//!
//! The blend is mapped onto the cumulative weights of the zone's blocks.
//! The result depends only on `(seed, x, y)` and the tables passed in.

use rand::Rng;

use crate::block::{Block, OreTable};
use crate::chunk::TilePos;
use crate::noise::{SimplexNoise, WorldSeed};
use crate::zone::DepthZone;

/// Sub-seed purpose for the vein noise field.
const VEIN_NOISE_PURPOSE: u64 = 0x5645_494E;

/// Tile coordinates are scaled by this before sampling the noise field.
pub const VEIN_SCALE: f64 = 0.05;

/// Octaves of the vein noise field.
const VEIN_OCTAVES: u32 = 3;

/// Deterministic per-tile block picker.
pub struct VeinGenerator {
    seed: WorldSeed,
    noise: SimplexNoise,
}

impl VeinGenerator {
    /// Creates a generator for the given world seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            seed,
            noise: SimplexNoise::new(seed.derive(VEIN_NOISE_PURPOSE)),
        }
    }

    /// Smooth vein field at `pos`, in `[0, 1]`.
    #[must_use]
    pub fn vein_noise(&self, pos: TilePos) -> f64 {
        self.noise.unit(
            f64::from(pos.x) * VEIN_SCALE,
            f64::from(pos.y) * VEIN_SCALE,
            VEIN_OCTAVES,
        )
    }

    /// Block generated at `pos` inside `zone`.
    ///
    /// Row 0 is always grass. Blocks whose `min_depth` is below `pos.y` are
    /// skipped; if nothing qualifies the tile is stone.
    #[must_use]
    pub fn generate(&self, pos: TilePos, zone: &DepthZone, ores: &OreTable) -> Block {
        if pos.y == 0 {
            return Block::Grass;
        }

        let total_weight: u64 = zone
            .blocks
            .iter()
            .map(|&block| u64::from(ores.weight(block)))
            .sum();
        if total_weight == 0 {
            return Block::Stone;
        }

        let draw: f64 = self.seed.for_tile(pos.x, pos.y).rng().gen();
        let target = (self.vein_noise(pos) + draw) / 2.0 * total_weight as f64;

        let mut cumulative = 0u64;
        for &block in &zone.blocks {
            let spec = ores.get(block);
            if spec.min_depth > pos.y {
                continue;
            }
            cumulative += u64::from(spec.weight);
            if spec.weight > 0 && target <= cumulative as f64 {
                return block;
            }
        }
        Block::Stone
    }
}
