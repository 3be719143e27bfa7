//! # Cave Carving
//!
//! Caves are shaped by a small cellular automaton run on a scratch grid the
//! size of one chunk, then stamped onto the chunk's generated blocks.
//!
//! ## Rule
//!
//! Moore neighbourhood (8 cells), cells outside the grid count as solid:
//!
//! - solid with fewer than 4 solid neighbours opens up,
//! - open with 5 or more solid neighbours fills in.
//!
//! Protected rare ores are never removed or overwritten.

use rand::Rng;

use crate::block::Block;
use crate::chunk::{Chunk, TilePos, CHUNK_SIZE};
use crate::zone::DepthZone;

/// Automaton passes per cave.
pub const CA_ITERATIONS: usize = 4;

/// Scratch grid: `true` is solid, `false` is open.
pub type CaveGrid = [[bool; CHUNK_SIZE]; CHUNK_SIZE];

/// What a carve did to a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaveReport {
    /// Tiles turned empty.
    pub carved: usize,
    /// Tiles turned into the zone's wall block.
    pub walls: usize,
    /// Tile that received a bonus rare ore, if any.
    pub treasure: Option<TilePos>,
}

/// Carves caves into freshly generated chunks.
#[derive(Clone, Copy, Debug)]
pub struct CaveCarver {
    wall_chance: f64,
    treasure_chance: f64,
}

impl CaveCarver {
    /// Creates a carver.
    ///
    /// `wall_chance` is the per-tile chance that a solid tile bordering the
    /// cave becomes a wall block. `treasure_chance` is the per-cave chance of
    /// a bonus rare ore in treasure zones.
    #[must_use]
    pub const fn new(wall_chance: f64, treasure_chance: f64) -> Self {
        Self {
            wall_chance,
            treasure_chance,
        }
    }

    /// Runs the automaton and returns the final cave shape.
    #[must_use]
    pub fn shape<R: Rng + ?Sized>(cave_size: u32, rng: &mut R) -> CaveGrid {
        let mut grid = [[true; CHUNK_SIZE]; CHUNK_SIZE];

        let radius = (cave_size / 2).max(2) as i32;
        let reach = radius * radius + radius;
        let seeds = rng.gen_range(1..=3);
        for _ in 0..seeds {
            let sx = rng.gen_range(2..=CHUNK_SIZE as i32 - 3);
            let sy = rng.gen_range(2..=CHUNK_SIZE as i32 - 3);
            for (y, row) in grid.iter_mut().enumerate() {
                for (x, cell) in row.iter_mut().enumerate() {
                    let dx = x as i32 - sx;
                    let dy = y as i32 - sy;
                    if dx * dx + dy * dy <= reach {
                        *cell = false;
                    }
                }
            }
        }

        for _ in 0..CA_ITERATIONS {
            grid = step(&grid);
        }
        grid
    }

    /// Carves a cave into `chunk` using the parameters of `zone`.
    pub fn carve<R: Rng + ?Sized>(
        &self,
        chunk: &mut Chunk,
        zone: &DepthZone,
        rng: &mut R,
    ) -> CaveReport {
        let grid = Self::shape(zone.cave_size, rng);
        let mut report = CaveReport::default();

        for (ly, row) in grid.iter().enumerate() {
            for (lx, &solid) in row.iter().enumerate() {
                let Some(block) = chunk.get(lx, ly) else {
                    continue;
                };
                if block.is_rare() {
                    continue;
                }
                if !solid {
                    if chunk.set(lx, ly, Block::Empty) {
                        report.carved += 1;
                    }
                } else if open_neighbors(&grid, lx, ly) > 0
                    && rng.gen::<f64>() < self.wall_chance
                    && chunk.set(lx, ly, zone.wall_block)
                {
                    report.walls += 1;
                }
            }
        }

        if rng.gen::<f64>() < self.treasure_chance && zone.treasure {
            report.treasure = place_treasure(chunk, &grid, rng);
        }

        report
    }
}

/// Turns one solid, cave-adjacent, non-rare tile into a random rare ore.
fn place_treasure<R: Rng + ?Sized>(
    chunk: &mut Chunk,
    grid: &CaveGrid,
    rng: &mut R,
) -> Option<TilePos> {
    let mut candidates = Vec::new();
    for (ly, row) in grid.iter().enumerate() {
        for (lx, &solid) in row.iter().enumerate() {
            let eligible = matches!(chunk.get(lx, ly), Some(b) if b.is_solid() && !b.is_rare());
            if solid && eligible && open_neighbors(grid, lx, ly) > 0 {
                candidates.push((lx, ly));
            }
        }
    }
    if candidates.is_empty() {
        return None;
    }

    let (lx, ly) = candidates[rng.gen_range(0..candidates.len())];
    let ore = Block::RARE_ORES[rng.gen_range(0..Block::RARE_ORES.len())];
    chunk.set(lx, ly, ore);
    Some(chunk.tile_pos(lx, ly))
}

/// One automaton pass.
fn step(grid: &CaveGrid) -> CaveGrid {
    let mut next = *grid;
    for (y, row) in grid.iter().enumerate() {
        for (x, &solid) in row.iter().enumerate() {
            let walls = solid_neighbors(grid, x, y);
            if solid && walls < 4 {
                next[y][x] = false;
            } else if !solid && walls >= 5 {
                next[y][x] = true;
            }
        }
    }
    next
}

fn solid_neighbors(grid: &CaveGrid, x: usize, y: usize) -> usize {
    8 - open_neighbors(grid, x, y)
}

/// Open Moore neighbours inside the grid.
fn open_neighbors(grid: &CaveGrid, x: usize, y: usize) -> usize {
    let mut count = 0;
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if (0..CHUNK_SIZE as i32).contains(&nx)
                && (0..CHUNK_SIZE as i32).contains(&ny)
                && !grid[ny as usize][nx as usize]
            {
                count += 1;
            }
        }
    }
    count
}
