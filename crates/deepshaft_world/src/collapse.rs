//! # Instability and Collapse
//!
//! Unstable tiles hold until they are undermined. Once one has at least two
//! empty orthogonal neighbours its timer starts; when the timer reaches the
//! collapse delay the tile turns into a falling rock and its cell empties,
//! which can undermine the next unstable tile in turn.
//!
//! ```text
//! stable -> unstable -> timer running -> falling rock -> landed | despawned
//! ```
//!
//! Rocks live in a fixed-size pool. When the pool is full a due tile simply
//! keeps its timer and tries again on the next tick.

use std::collections::HashMap;

use deepshaft_core::PoolAllocator;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::block::Block;
use crate::chunk::{ChunkStore, TilePos};
use crate::config::WorldConfig;

/// Empty orthogonal neighbours an unstable tile needs before its timer runs.
const MIN_EMPTY_SIDES: usize = 2;

/// A collapsed tile in flight. Positions are physical units, `y` grows down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallingRock {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Downward speed in units per second.
    pub velocity: f32,
    /// Block the rock was made from.
    pub block: Block,
}

/// Result of one simulation tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollapseTick {
    /// Ore value of rocks that landed this tick.
    pub value: u64,
    /// Tiles that collapsed into rocks this tick, in processing order.
    pub collapsed: Vec<TilePos>,
}

/// Owns the rock pool and the unstable timers.
pub struct CollapseSimulator {
    rocks: PoolAllocator<FallingRock>,
    timers: HashMap<u64, f32>,
    rng: ChaCha8Rng,
    tile_size: f32,
    gravity: f32,
    collapse_delay: f32,
    speed_min: f32,
    speed_max: f32,
}

impl CollapseSimulator {
    /// Creates a simulator from world settings and an RNG for rock speeds.
    #[must_use]
    pub fn new(config: &WorldConfig, rng: ChaCha8Rng) -> Self {
        Self {
            rocks: PoolAllocator::new(config.rock_pool_size),
            timers: HashMap::new(),
            rng,
            tile_size: config.tile_size,
            gravity: config.gravity,
            collapse_delay: config.collapse_delay,
            speed_min: config.rock_speed_min,
            speed_max: config.rock_speed_max,
        }
    }

    /// Starts (or restarts) the timer of every unstable neighbour of `pos`
    /// that now has at least two empty orthogonal neighbours.
    ///
    /// Called whenever `pos` becomes empty.
    pub fn check_stability(&mut self, store: &mut ChunkStore, pos: TilePos) {
        for neighbor in pos.neighbors() {
            if store.block_at(neighbor) != Some(Block::Unstable) {
                continue;
            }
            let empty_sides = empty_sides(store, neighbor);
            if empty_sides >= MIN_EMPTY_SIDES {
                tracing::trace!(
                    "Unstable tile ({}, {}) undermined on {} sides",
                    neighbor.x,
                    neighbor.y,
                    empty_sides
                );
                self.timers.insert(neighbor.pack(), 0.0);
            }
        }
    }

    /// Drops the timers at `pos` and its neighbours that no longer qualify.
    ///
    /// Called whenever `pos` is filled.
    pub fn recheck_stability(&mut self, store: &mut ChunkStore, pos: TilePos) {
        let mut tiles = pos.neighbors().to_vec();
        tiles.push(pos);
        for tile in tiles {
            if !self.timers.contains_key(&tile.pack()) {
                continue;
            }
            if store.block_at(tile) != Some(Block::Unstable)
                || empty_sides(store, tile) < MIN_EMPTY_SIDES
            {
                tracing::trace!("Unstable tile ({}, {}) re-stabilized", tile.x, tile.y);
                self.timers.remove(&tile.pack());
            }
        }
    }

    /// Puts a rock in flight. Returns `false` when the pool is exhausted.
    pub fn spawn_rock(&mut self, x: f32, y: f32, velocity: f32, block: Block) -> bool {
        let spawned = self
            .rocks
            .allocate(FallingRock {
                x,
                y,
                velocity,
                block,
            })
            .is_some();
        if spawned {
            tracing::debug!("Spawned falling {} rock at ({}, {})", block, x, y);
        }
        spawned
    }

    /// Advances rocks, then timers, by `dt` seconds.
    pub fn update(&mut self, store: &mut ChunkStore, dt: f32) -> CollapseTick {
        let value = self.advance_rocks(store, dt);
        let collapsed = self.advance_timers(store, dt);
        CollapseTick { value, collapsed }
    }

    fn advance_rocks(&mut self, store: &mut ChunkStore, dt: f32) -> u64 {
        let tile_size = self.tile_size;
        let gravity = self.gravity;
        let max_depth = store.bounds().max_depth;
        let mut total = 0u64;

        self.rocks.retain_mut(
            |rock| {
                let column = (rock.x / tile_size).floor() as i32;
                let first_row = row_below(rock.y, tile_size).max(0);
                rock.velocity += gravity * dt;
                rock.y += rock.velocity * dt;
                let last_row = row_below(rock.y, tile_size).min(max_depth - 1);

                // Sweep every row the bottom edge crossed this tick.
                let floor = (first_row..=last_row).find(|&row| {
                    store
                        .block_at(TilePos::new(column, row))
                        .is_some_and(Block::is_solid)
                });
                if let Some(row) = floor {
                    rock.y = (row - 1) as f32 * tile_size;
                    let value = store.ores().value(rock.block);
                    tracing::debug!(
                        "Falling {} rock landed on ({}, {}) worth {}",
                        rock.block,
                        column,
                        row,
                        value
                    );
                    total += u64::from(value);
                    return false;
                }

                if rock.y / tile_size >= max_depth as f32 {
                    tracing::debug!("Falling {} rock left the shaft", rock.block);
                    return false;
                }
                true
            },
            drop,
        );
        total
    }

    fn advance_timers(&mut self, store: &mut ChunkStore, dt: f32) -> Vec<TilePos> {
        let mut due = Vec::new();
        self.timers.retain(|&key, elapsed| {
            let pos = TilePos::unpack(key);
            if store.block_at(pos) != Some(Block::Unstable)
                || empty_sides(store, pos) < MIN_EMPTY_SIDES
            {
                return false;
            }
            *elapsed += dt;
            if *elapsed >= self.collapse_delay {
                due.push(pos);
            }
            true
        });
        due.sort_unstable();

        let mut collapsed = Vec::new();
        for pos in due {
            // An earlier collapse this tick may have restarted this timer.
            let still_due = self
                .timers
                .get(&pos.pack())
                .is_some_and(|&elapsed| elapsed >= self.collapse_delay);
            if !still_due {
                continue;
            }
            if self.rocks.is_full() {
                tracing::trace!("Rock pool full, ({}, {}) waits", pos.x, pos.y);
                continue;
            }
            let Some(block) = store.block_at(pos) else {
                continue;
            };

            let speed = if self.speed_max > self.speed_min {
                self.rng.gen_range(self.speed_min..=self.speed_max)
            } else {
                self.speed_min
            };
            let x = pos.x as f32 * self.tile_size;
            let y = pos.y as f32 * self.tile_size;
            if !self.spawn_rock(x, y, speed, block) {
                continue;
            }

            self.timers.remove(&pos.pack());
            store.set_block(pos, Block::Empty);
            self.check_stability(store, pos);
            collapsed.push(pos);
        }
        collapsed
    }

    /// Tiles with a running timer, sorted.
    #[must_use]
    pub fn hazards(&self) -> Vec<TilePos> {
        let mut tiles: Vec<TilePos> =
            self.timers.keys().map(|&key| TilePos::unpack(key)).collect();
        tiles.sort_unstable();
        tiles
    }

    /// Elapsed seconds on the timer at `pos`, if one is running.
    #[must_use]
    pub fn timer(&self, pos: TilePos) -> Option<f32> {
        self.timers.get(&pos.pack()).copied()
    }

    /// Drops timers for which `keep` returns false.
    pub fn retain_timers(&mut self, mut keep: impl FnMut(TilePos) -> bool) {
        self.timers.retain(|&key, _| keep(TilePos::unpack(key)));
    }

    /// Removes every rock in flight.
    pub fn clear_rocks(&mut self) {
        self.rocks.clear();
    }

    /// Rocks currently in flight.
    pub fn rocks(&self) -> impl Iterator<Item = &FallingRock> {
        self.rocks.iter().map(|(_, rock)| rock)
    }

    /// Number of rocks in flight.
    #[must_use]
    pub fn active_rock_count(&self) -> usize {
        self.rocks.allocated_count()
    }

    /// Rock pool capacity.
    #[must_use]
    pub fn rock_capacity(&self) -> usize {
        self.rocks.capacity()
    }
}

/// Number of empty orthogonal neighbours of `pos`.
fn empty_sides(store: &mut ChunkStore, pos: TilePos) -> usize {
    pos.neighbors()
        .into_iter()
        .filter(|&side| store.block_at(side) == Some(Block::Empty))
        .count()
}

/// Tile row directly under a rock whose top edge is at `y`.
fn row_below(y: f32, tile_size: f32) -> i32 {
    ((y + tile_size) / tile_size).floor() as i32
}
