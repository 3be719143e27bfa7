//! # Blocks and Ore Table
//!
//! Every tile in the shaft holds one [`Block`]. Gameplay attributes (sell
//! value, base mining time, generation weight, minimum depth) live in an
//! [`OreTable`] so they can be rebalanced from config without touching the
//! generator.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Block identity of a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Block {
    /// Mined out / open air.
    Empty = 0,
    /// Surface opening.
    Grass = 1,
    /// Soft soil.
    Dirt = 2,
    /// Bulk rock.
    Stone = 3,
    /// Coal seam.
    Coal = 4,
    /// Copper ore.
    Copper = 5,
    /// Tin ore.
    Tin = 6,
    /// Iron ore.
    Iron = 7,
    /// Silver ore.
    Silver = 8,
    /// Gold ore.
    Gold = 9,
    /// Ruby (rare).
    Ruby = 10,
    /// Sapphire (rare).
    Sapphire = 11,
    /// Emerald (rare).
    Emerald = 12,
    /// Amethyst.
    Amethyst = 13,
    /// Platinum ore.
    Platinum = 14,
    /// Mithril (rare).
    Mithril = 15,
    /// Diamond (rare).
    Diamond = 16,
    /// Cavern boundary rock.
    CaveWall = 17,
    /// Cavern boundary rock in the Crystal Cavern.
    CrystalWall = 18,
    /// Cracked rock that collapses once undermined.
    Unstable = 19,
}

impl Block {
    /// Number of block kinds.
    pub const COUNT: usize = 20;

    /// Every block, in id order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Empty,
        Self::Grass,
        Self::Dirt,
        Self::Stone,
        Self::Coal,
        Self::Copper,
        Self::Tin,
        Self::Iron,
        Self::Silver,
        Self::Gold,
        Self::Ruby,
        Self::Sapphire,
        Self::Emerald,
        Self::Amethyst,
        Self::Platinum,
        Self::Mithril,
        Self::Diamond,
        Self::CaveWall,
        Self::CrystalWall,
        Self::Unstable,
    ];

    /// Ores that cave carving must never destroy.
    pub const RARE_ORES: [Self; 5] = [
        Self::Ruby,
        Self::Sapphire,
        Self::Emerald,
        Self::Mithril,
        Self::Diamond,
    ];

    /// Numeric id used by the binary snapshot format.
    #[inline]
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Converts from a numeric id.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        if (value as usize) < Self::COUNT {
            Some(Self::ALL[value as usize])
        } else {
            None
        }
    }

    /// Canonical snake_case name, as used in save files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Grass => "grass",
            Self::Dirt => "dirt",
            Self::Stone => "stone",
            Self::Coal => "coal",
            Self::Copper => "copper",
            Self::Tin => "tin",
            Self::Iron => "iron",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Ruby => "ruby",
            Self::Sapphire => "sapphire",
            Self::Emerald => "emerald",
            Self::Amethyst => "amethyst",
            Self::Platinum => "platinum",
            Self::Mithril => "mithril",
            Self::Diamond => "diamond",
            Self::CaveWall => "cave_wall",
            Self::CrystalWall => "crystal_wall",
            Self::Unstable => "unstable",
        }
    }

    /// True for every block except [`Block::Empty`].
    #[inline]
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !matches!(self, Self::Empty)
    }

    /// True for the protected rare ores.
    #[inline]
    #[must_use]
    pub const fn is_rare(self) -> bool {
        matches!(
            self,
            Self::Ruby | Self::Sapphire | Self::Emerald | Self::Mithril | Self::Diamond
        )
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Block {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|block| block.name() == s)
            .ok_or_else(|| WorldError::UnknownBlock(s.to_owned()))
    }
}

/// Gameplay attributes of one block kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OreSpec {
    /// Sell value credited when the block is collected.
    pub value: u32,
    /// Base mining time in seconds, before tool modifiers.
    pub mining_time: f32,
    /// Relative generation weight inside a depth zone.
    pub weight: u32,
    /// Shallowest tile row at which the generator may place this block.
    pub min_depth: i32,
}

impl OreSpec {
    /// Creates an ore spec.
    #[must_use]
    pub const fn new(value: u32, mining_time: f32, weight: u32, min_depth: i32) -> Self {
        Self {
            value,
            mining_time,
            weight,
            min_depth,
        }
    }
}

impl Default for OreSpec {
    fn default() -> Self {
        Self::new(0, 1.0, 0, 0)
    }
}

/// Attribute table indexed by block id.
///
/// Deserializes from a map of block name to [`OreSpec`]; entries not listed
/// keep their built-in defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Block, OreSpec>", into = "BTreeMap<Block, OreSpec>")]
pub struct OreTable {
    specs: [OreSpec; Block::COUNT],
}

impl OreTable {
    /// Attributes for `block`.
    #[inline]
    #[must_use]
    pub fn get(&self, block: Block) -> &OreSpec {
        &self.specs[block as usize]
    }

    /// Replaces the attributes for `block`.
    pub fn set(&mut self, block: Block, spec: OreSpec) {
        self.specs[block as usize] = spec;
    }

    /// Sell value of `block`.
    #[inline]
    #[must_use]
    pub fn value(&self, block: Block) -> u32 {
        self.get(block).value
    }

    /// Generation weight of `block`.
    #[inline]
    #[must_use]
    pub fn weight(&self, block: Block) -> u32 {
        self.get(block).weight
    }
}

impl Default for OreTable {
    fn default() -> Self {
        let mut specs = [OreSpec::default(); Block::COUNT];
        let defaults = [
            (Block::Empty, OreSpec::new(0, 0.0, 0, 0)),
            (Block::Grass, OreSpec::new(0, 0.3, 30, 0)),
            (Block::Dirt, OreSpec::new(1, 0.5, 50, 0)),
            (Block::Stone, OreSpec::new(2, 1.0, 60, 0)),
            (Block::Coal, OreSpec::new(3, 1.0, 30, 0)),
            (Block::Copper, OreSpec::new(4, 1.2, 20, 0)),
            (Block::Tin, OreSpec::new(4, 1.2, 20, 0)),
            (Block::Iron, OreSpec::new(5, 1.5, 15, 0)),
            (Block::Silver, OreSpec::new(8, 1.7, 10, 60)),
            (Block::Gold, OreSpec::new(10, 2.0, 8, 400)),
            (Block::Ruby, OreSpec::new(50, 3.0, 4, 300)),
            (Block::Sapphire, OreSpec::new(50, 3.0, 4, 300)),
            (Block::Emerald, OreSpec::new(50, 3.0, 4, 300)),
            (Block::Amethyst, OreSpec::new(30, 2.5, 4, 500)),
            (Block::Platinum, OreSpec::new(75, 3.5, 3, 500)),
            (Block::Mithril, OreSpec::new(100, 4.0, 2, 600)),
            (Block::Diamond, OreSpec::new(200, 5.0, 1, 1000)),
            (Block::CaveWall, OreSpec::new(0, 2.0, 0, 0)),
            (Block::CrystalWall, OreSpec::new(0, 2.5, 0, 0)),
            (Block::Unstable, OreSpec::new(0, 0.8, 0, 0)),
        ];
        for (block, spec) in defaults {
            specs[block as usize] = spec;
        }
        Self { specs }
    }
}

impl From<BTreeMap<Block, OreSpec>> for OreTable {
    fn from(overrides: BTreeMap<Block, OreSpec>) -> Self {
        let mut table = Self::default();
        for (block, spec) in overrides {
            table.set(block, spec);
        }
        table
    }
}

impl From<OreTable> for BTreeMap<Block, OreSpec> {
    fn from(table: OreTable) -> Self {
        Block::ALL
            .iter()
            .map(|&block| (block, *table.get(block)))
            .collect()
    }
}
