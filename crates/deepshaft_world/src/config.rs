//! # World Configuration
//!
//! Everything tunable about a shaft, loaded once at startup. Every field has
//! a default, so a config file only needs the values it changes:
//!
//! ```toml
//! seed = 42
//! num_cols = 64
//!
//! [ores.gold]
//! value = 12
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::block::OreTable;
use crate::error::{WorldError, WorldResult};
use crate::noise::WorldSeed;
use crate::zone::ZoneTable;

/// World construction parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Generation seed.
    pub seed: u64,
    /// Shaft width in tiles.
    pub num_cols: i32,
    /// Shaft depth in tiles.
    pub max_depth: i32,
    /// Physical size of one tile.
    pub tile_size: f32,
    /// Maximum simultaneous falling rocks.
    pub rock_pool_size: usize,
    /// Seconds an undermined unstable tile holds before it falls.
    pub collapse_delay: f32,
    /// Downward acceleration of falling rocks, units/s².
    pub gravity: f32,
    /// Lower bound of a collapsing rock's initial speed.
    pub rock_speed_min: f32,
    /// Upper bound of a collapsing rock's initial speed.
    pub rock_speed_max: f32,
    /// Chunks whose top row is at or above this row never get caves.
    pub cave_floor: i32,
    /// Rows at or above this never get unstable tiles.
    pub hazard_floor: i32,
    /// Chance a cave-bordering tile becomes a wall block.
    pub wall_chance: f64,
    /// Chance a cave in a treasure zone hides a rare ore.
    pub treasure_chance: f64,
    /// Depth zones.
    pub zones: ZoneTable,
    /// Per-block attributes.
    pub ores: OreTable,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: WorldSeed::default().value(),
            num_cols: 100,
            max_depth: 100_000,
            tile_size: 32.0,
            rock_pool_size: 5,
            collapse_delay: 2.0,
            gravity: 30.0,
            rock_speed_min: 200.0,
            rock_speed_max: 400.0,
            cave_floor: 10,
            hazard_floor: 50,
            wall_chance: 0.2,
            treasure_chance: 0.1,
            zones: ZoneTable::default(),
            ores: OreTable::default(),
        }
    }
}

impl WorldConfig {
    /// Default configuration with a specific seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ConfigParse`] for malformed TOML (including a
    /// zone table with bad ordering) and [`WorldError::InvalidConfig`] if a
    /// value is out of range.
    pub fn from_toml_str(text: &str) -> WorldResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Io`] if the file cannot be read, otherwise as
    /// [`WorldConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> WorldResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> WorldResult<()> {
        let fail = |msg: &str| Err(WorldError::InvalidConfig(msg.to_owned()));

        if self.num_cols <= 0 {
            return fail("num_cols must be positive");
        }
        if self.max_depth <= 0 {
            return fail("max_depth must be positive");
        }
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return fail("tile_size must be positive");
        }
        if !(self.collapse_delay.is_finite() && self.collapse_delay >= 0.0) {
            return fail("collapse_delay must be non-negative");
        }
        if !self.gravity.is_finite() {
            return fail("gravity must be finite");
        }
        if !(self.rock_speed_min.is_finite()
            && self.rock_speed_max.is_finite()
            && self.rock_speed_min <= self.rock_speed_max)
        {
            return fail("rock_speed_min must not exceed rock_speed_max");
        }
        for (name, chance) in [
            ("wall_chance", self.wall_chance),
            ("treasure_chance", self.treasure_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(WorldError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {chance}"
                )));
            }
        }
        Ok(())
    }

    /// Seed as a [`WorldSeed`].
    #[inline]
    #[must_use]
    pub const fn world_seed(&self) -> WorldSeed {
        WorldSeed::new(self.seed)
    }
}
