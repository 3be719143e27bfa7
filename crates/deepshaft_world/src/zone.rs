//! # Depth Zones
//!
//! The shaft is split into horizontal bands. Each band decides which blocks
//! the vein generator may place, how often caves and hazards appear, and how
//! much its ore is worth.
//!
//! Lookup is a linear scan keeping the last zone whose threshold is at or
//! below the queried depth. There are only a handful of zones.

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::{WorldError, WorldResult};

/// One depth band and its generation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthZone {
    /// Display name.
    pub name: String,
    /// First tile row belonging to this zone.
    pub threshold: i32,
    /// Blocks the vein generator may place, in walk order.
    pub blocks: Vec<Block>,
    /// Base probability of tagging a tile unstable.
    #[serde(default)]
    pub hazard_chance: f64,
    /// Probability that a chunk starting in this zone gets a cave.
    #[serde(default)]
    pub cave_chance: f64,
    /// Nominal cave diameter in tiles.
    #[serde(default)]
    pub cave_size: u32,
    /// Economic multiplier applied by the host to sales in this zone.
    #[serde(default = "default_value_scale")]
    pub value_scale: f64,
    /// Whether carved caves may hide a bonus rare ore.
    #[serde(default)]
    pub treasure: bool,
    /// Block used for visible cavern boundaries.
    #[serde(default = "default_wall_block")]
    pub wall_block: Block,
}

fn default_value_scale() -> f64 {
    1.0
}

fn default_wall_block() -> Block {
    Block::CaveWall
}

impl DepthZone {
    fn preset(
        name: &str,
        threshold: i32,
        blocks: &[Block],
        hazard_chance: f64,
        cave_chance: f64,
        cave_size: u32,
        value_scale: f64,
    ) -> Self {
        Self {
            name: name.to_owned(),
            threshold,
            blocks: blocks.to_vec(),
            hazard_chance,
            cave_chance,
            cave_size,
            value_scale,
            treasure: false,
            wall_block: Block::CaveWall,
        }
    }

    fn with_treasure(mut self) -> Self {
        self.treasure = true;
        self
    }

    fn with_wall(mut self, wall: Block) -> Self {
        self.wall_block = wall;
        self
    }
}

/// Ordered, validated list of depth zones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DepthZone>", into = "Vec<DepthZone>")]
pub struct ZoneTable {
    zones: Vec<DepthZone>,
}

impl ZoneTable {
    /// Builds a table, checking that the first threshold is 0 and thresholds
    /// strictly increase.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if the ordering invariant fails
    /// or the list is empty.
    pub fn new(zones: Vec<DepthZone>) -> WorldResult<Self> {
        let first = zones
            .first()
            .ok_or_else(|| WorldError::InvalidConfig("zone table is empty".into()))?;
        if first.threshold != 0 {
            return Err(WorldError::InvalidConfig(format!(
                "first zone {:?} must start at depth 0, starts at {}",
                first.name, first.threshold
            )));
        }
        for pair in zones.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(WorldError::InvalidConfig(format!(
                    "zone {:?} (threshold {}) must be deeper than {:?} (threshold {})",
                    pair[1].name, pair[1].threshold, pair[0].name, pair[0].threshold
                )));
            }
        }
        for zone in &zones {
            let chances = [zone.hazard_chance, zone.cave_chance];
            if chances.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(WorldError::InvalidConfig(format!(
                    "zone {:?} has a probability outside [0, 1]",
                    zone.name
                )));
            }
        }
        Ok(Self { zones })
    }

    /// Zone in effect at tile row `depth`.
    ///
    /// Depths above every threshold (negative rows) get the first zone.
    #[must_use]
    pub fn zone_for(&self, depth: i32) -> &DepthZone {
        let mut current = &self.zones[0];
        for zone in &self.zones {
            if depth >= zone.threshold {
                current = zone;
            } else {
                break;
            }
        }
        current
    }

    /// All zones, shallowest first.
    #[must_use]
    pub fn zones(&self) -> &[DepthZone] {
        &self.zones
    }
}

impl Default for ZoneTable {
    fn default() -> Self {
        use Block::{
            Amethyst, Coal, Copper, CrystalWall, Diamond, Dirt, Emerald, Gold, Grass, Iron,
            Mithril, Platinum, Ruby, Sapphire, Silver, Stone, Tin,
        };

        let zones = vec![
            DepthZone::preset("Surface", 0, &[Grass, Dirt], 0.0, 0.0, 0, 1.0),
            DepthZone::preset("Shallow", 1, &[Dirt, Stone, Coal, Copper, Tin], 0.005, 0.1, 3, 1.0),
            DepthZone::preset("Mid", 50, &[Stone, Coal, Iron, Silver], 0.01, 0.15, 5, 1.5),
            DepthZone::preset("Crystal Cavern", 300, &[Stone, Ruby, Sapphire, Emerald], 0.015, 0.2, 7, 2.0)
                .with_treasure()
                .with_wall(CrystalWall),
            DepthZone::preset(
                "Deep",
                500,
                &[Stone, Iron, Silver, Gold, Sapphire, Ruby, Emerald, Amethyst, Platinum, Mithril],
                0.02,
                0.1,
                4,
                3.0,
            )
            .with_treasure(),
            DepthZone::preset(
                "Abyss",
                1000,
                &[Stone, Gold, Sapphire, Ruby, Emerald, Amethyst, Platinum, Mithril, Diamond],
                0.03,
                0.15,
                6,
                5.0,
            )
            .with_treasure(),
        ];
        Self { zones }
    }
}

impl TryFrom<Vec<DepthZone>> for ZoneTable {
    type Error = WorldError;

    fn try_from(zones: Vec<DepthZone>) -> WorldResult<Self> {
        Self::new(zones)
    }
}

impl From<ZoneTable> for Vec<DepthZone> {
    fn from(table: ZoneTable) -> Self {
        table.zones
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let table = ZoneTable::default();
        assert!(ZoneTable::new(table.zones().to_vec()).is_ok());
        assert_eq!(table.zones().len(), 6);
    }

    #[test]
    fn test_zone_boundaries() {
        let table = ZoneTable::default();
        assert_eq!(table.zone_for(0).name, "Surface");
        assert_eq!(table.zone_for(1).name, "Shallow");
        assert_eq!(table.zone_for(49).name, "Shallow");
        assert_eq!(table.zone_for(50).name, "Mid");
        assert_eq!(table.zone_for(300).name, "Crystal Cavern");
        assert_eq!(table.zone_for(999).name, "Deep");
        assert_eq!(table.zone_for(1_000_000).name, "Abyss");
    }

    #[test]
    fn test_negative_depth_gets_first_zone() {
        let table = ZoneTable::default();
        assert_eq!(table.zone_for(-5).name, "Surface");
    }

    #[test]
    fn test_zone_monotonicity() {
        let table = ZoneTable::default();
        let mut last = table.zone_for(0).threshold;
        for depth in 0..1500 {
            let threshold = table.zone_for(depth).threshold;
            assert!(threshold >= last, "threshold went backwards at depth {depth}");
            assert!(threshold <= depth);
            last = threshold;
        }
    }

    #[test]
    fn test_crystal_cavern_walls() {
        let table = ZoneTable::default();
        assert_eq!(table.zone_for(350).wall_block, Block::CrystalWall);
        assert!(table.zone_for(350).treasure);
        assert_eq!(table.zone_for(60).wall_block, Block::CaveWall);
        assert!(!table.zone_for(60).treasure);
    }

    #[test]
    fn test_rejects_bad_ordering() {
        let mut zones = ZoneTable::default().zones().to_vec();
        zones.swap(2, 3);
        assert!(matches!(ZoneTable::new(zones), Err(WorldError::InvalidConfig(_))));

        let mut zones = ZoneTable::default().zones().to_vec();
        zones[0].threshold = 3;
        assert!(ZoneTable::new(zones).is_err());

        assert!(ZoneTable::new(Vec::new()).is_err());
    }

    #[test]
    fn test_zones_from_toml() {
        let text = r#"
            [[zones]]
            name = "Top"
            threshold = 0
            blocks = ["dirt"]

            [[zones]]
            name = "Bottom"
            threshold = 10
            blocks = ["stone", "gold"]
            cave_chance = 0.5
            cave_size = 4
            treasure = true
            wall_block = "crystal_wall"
        "#;

        #[derive(Deserialize)]
        struct Wrapper {
            zones: ZoneTable,
        }

        let parsed: Wrapper = toml::from_str(text).unwrap();
        let bottom = parsed.zones.zone_for(12);
        assert_eq!(bottom.name, "Bottom");
        assert_eq!(bottom.blocks, vec![Block::Stone, Block::Gold]);
        assert_eq!(bottom.wall_block, Block::CrystalWall);
        assert!((parsed.zones.zone_for(0).value_scale - 1.0).abs() < f64::EPSILON);
    }
}
