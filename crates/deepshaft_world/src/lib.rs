//! # DEEPSHAFT World
//!
//! Procedural world engine for a 2-D mining game: a fixed-width shaft that is
//! generated lazily, chunk by chunk, as the player digs down.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same shaft
//! 2. **Lazy**: Chunks are generated on first touch and never evicted
//! 3. **Edits win**: Every change is recorded in a sparse map that overrides
//!    the generator, so saves survive regeneration
//! 4. **Never fails at runtime**: Queries outside the shaft return `None`,
//!    writes there return `false`
//!
//! ## Core Components
//!
//! - `ZoneTable`: Depth bands with their blocks, caves and hazards
//! - `VeinGenerator`: Noise-driven per-tile ore choice
//! - `ChunkStore`: Lazy chunks over the authoritative `SparseMap`
//! - `CaveCarver`: Cellular-automaton caves that spare rare ores
//! - `CollapseSimulator`: Unstable tiles and pooled falling rocks
//! - `World`: The facade tying it all together
//!
//! ## Example
//!
//! ```rust
//! use deepshaft_world::{Block, TilePos, World, WorldConfig};
//!
//! let config = WorldConfig {
//!     num_cols: 10,
//!     max_depth: 20,
//!     ..WorldConfig::with_seed(42)
//! };
//! let mut world = World::new(config).unwrap();
//! world.ensure_depth(19);
//!
//! assert_eq!(world.block_at(TilePos::new(0, 0)), Some(Block::Grass));
//! assert_eq!(world.block_at(TilePos::new(10, 0)), None);
//!
//! world.set_block(TilePos::new(3, 4), Block::Empty);
//! let saved = world.export_sparse_map();
//! assert_eq!(saved.get(TilePos::new(3, 4)), Some(Block::Empty));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod block;
pub mod cave;
pub mod chunk;
pub mod collapse;
pub mod config;
pub mod error;
pub mod mining;
pub mod noise;
pub mod sparse;
pub mod vein;
pub mod world;
pub mod zone;

pub use block::{Block, OreSpec, OreTable};
pub use cave::{CaveCarver, CaveReport};
pub use chunk::{Chunk, ChunkCoord, ChunkStore, TilePos, WorldBounds, CHUNK_SIZE};
pub use collapse::{CollapseSimulator, CollapseTick, FallingRock};
pub use config::WorldConfig;
pub use error::{WorldError, WorldResult};
pub use mining::{BlockStateTracker, MiningStage};
pub use noise::{SimplexNoise, WorldSeed};
pub use sparse::SparseMap;
pub use vein::VeinGenerator;
pub use world::{TileRect, World};
pub use zone::{DepthZone, ZoneTable};
