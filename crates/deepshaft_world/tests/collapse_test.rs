//! # Collapse Integration Tests
//!
//! Undermined unstable tiles, falling rocks and the rock pool, driven
//! through the public `World` API.

use deepshaft_world::{Block, MiningStage, TilePos, World, WorldConfig};

fn tiny_world() -> World {
    let mut world = World::new(WorldConfig {
        num_cols: 10,
        max_depth: 20,
        ..WorldConfig::with_seed(42)
    })
    .unwrap();
    world.ensure_depth(19);
    world
}

fn undermine(world: &mut World, pos: TilePos) {
    world.set_block(pos, Block::Unstable);
    world.set_block(pos.offset(0, 1), Block::Empty);
    world.set_block(pos.offset(-1, 0), Block::Empty);
}

/// Test: An undermined tile holds for the full delay, then falls.
#[test]
fn test_collapse_timing() {
    let mut world = tiny_world();
    let pos = TilePos::new(5, 5);
    undermine(&mut world, pos);
    assert_eq!(world.get_hazard_blocks(), vec![pos]);

    for _ in 0..19 {
        world.update(0.1);
        assert_eq!(world.active_rock_count(), 0);
        assert_eq!(world.get_hazard_blocks(), vec![pos]);
        assert_eq!(world.peek(pos), Some(Block::Unstable));
    }

    world.update(0.2);
    assert_eq!(world.active_rock_count(), 1);
    assert_eq!(world.peek(pos), Some(Block::Empty));
    assert!(world.get_hazard_blocks().is_empty());

    let rock = world.falling_rocks().next().copied().unwrap();
    assert_eq!(rock.block, Block::Unstable);
    assert!((rock.x - 5.0 * 32.0).abs() < f32::EPSILON);
    assert!((rock.y - 5.0 * 32.0).abs() < f32::EPSILON);
}

/// Test: One undermined tile produces exactly one rock, which eventually
/// comes to rest, and the collapse earns nothing.
#[test]
fn test_collapse_conservation() {
    let mut world = tiny_world();
    let pos = TilePos::new(2, 8);
    undermine(&mut world, pos);

    let mut earned = 0;
    let mut peak_rocks = 0;
    for _ in 0..100 {
        earned += world.update(0.05);
        peak_rocks = peak_rocks.max(world.active_rock_count());
    }

    assert_eq!(peak_rocks, 1);
    assert_eq!(world.active_rock_count(), 0);
    assert_eq!(world.peek(pos), Some(Block::Empty));
    assert_eq!(earned, 0);
}

/// Test: A rock made of ore pays out when it lands.
#[test]
fn test_landing_rock_pays_value() {
    let mut world = tiny_world();
    for y in 1..20 {
        world.set_block(TilePos::new(7, y), Block::Empty);
    }
    world.set_block(TilePos::new(7, 12), Block::Stone);

    assert!(world.spawn_falling_rock(7.0 * 32.0, 32.0, 0.0, Block::Gold));

    let mut earned = 0;
    for _ in 0..200 {
        earned += world.update(0.05);
    }
    assert_eq!(earned, u64::from(world.ore_spec(Block::Gold).value));
    assert_eq!(world.active_rock_count(), 0);
}

/// Test: A fast rock stops on a one-tile floor instead of skipping it.
#[test]
fn test_fast_rock_hits_thin_floor() {
    let mut world = tiny_world();
    for y in 1..20 {
        world.set_block(TilePos::new(7, y), Block::Empty);
    }
    world.set_block(TilePos::new(7, 12), Block::Gold);

    assert!(world.spawn_falling_rock(7.0 * 32.0, 32.0, 400.0, Block::Diamond));
    let mut earned = 0;
    for _ in 0..40 {
        earned += world.update(0.25);
    }
    assert_eq!(earned, u64::from(world.ore_spec(Block::Diamond).value));
    assert_eq!(world.active_rock_count(), 0);
    assert_eq!(world.peek(TilePos::new(7, 12)), Some(Block::Gold));
}

/// Test: Refilling one side of an undermined tile stops its collapse.
#[test]
fn test_refill_restabilizes() {
    let mut world = tiny_world();
    let pos = TilePos::new(5, 5);
    undermine(&mut world, pos);
    assert_eq!(world.get_hazard_blocks(), vec![pos]);

    world.set_block(pos.offset(-1, 0), Block::Stone);
    assert!(world.get_hazard_blocks().is_empty());
    world.update(2.5);
    assert_eq!(world.peek(pos), Some(Block::Unstable));
    assert!(world.get_hazard_blocks().is_empty());
    assert_eq!(world.active_rock_count(), 0);
}

/// Test: With the pool full a due tile waits, then falls once a slot frees.
#[test]
fn test_pool_exhaustion_defers_collapse() {
    let mut world = tiny_world();
    for y in 1..20 {
        world.set_block(TilePos::new(0, y), Block::Empty);
    }
    let capacity = world.config().rock_pool_size;
    for _ in 0..capacity {
        assert!(world.spawn_falling_rock(0.0, 32.0, 0.0, Block::Stone));
    }
    assert!(!world.spawn_falling_rock(0.0, 32.0, 0.0, Block::Stone));

    let pos = TilePos::new(6, 6);
    undermine(&mut world, pos);

    world.update(2.2);
    assert_eq!(world.active_rock_count(), capacity);
    assert_eq!(world.peek(pos), Some(Block::Unstable));
    assert_eq!(world.get_hazard_blocks(), vec![pos]);

    for _ in 0..40 {
        world.update(0.5);
    }
    assert_eq!(world.peek(pos), Some(Block::Empty));
    assert!(world.get_hazard_blocks().is_empty());
    assert_eq!(world.active_rock_count(), 0);
}

/// Test: Emptying a tile, by hand or by collapse, forgets its crack stage.
#[test]
fn test_emptied_tiles_lose_mining_state() {
    let mut world = tiny_world();

    let dug = TilePos::new(1, 3);
    world.set_block_state(dug, MiningStage::from_progress(0.8));
    assert_eq!(world.get_block_state(dug).value(), 2);
    world.set_block(dug, Block::Empty);
    assert_eq!(world.get_block_state(dug), MiningStage::NONE);

    let pos = TilePos::new(5, 10);
    undermine(&mut world, pos);
    world.set_block_state(pos, MiningStage::new(1));
    world.update(2.5);
    assert_eq!(world.peek(pos), Some(Block::Empty));
    assert_eq!(world.get_block_state(pos), MiningStage::NONE);
}

/// Test: Blasting next to an unstable tile starts its timer.
#[test]
fn test_blast_undermines_neighbors() {
    let mut world = tiny_world();
    let pos = TilePos::new(5, 12);
    world.set_block(pos, Block::Unstable);

    let removed = world.blast(TilePos::new(4, 13), 1.0);
    assert!(removed.iter().all(|&(tile, _)| tile != pos));
    assert_eq!(world.get_hazard_blocks(), vec![pos]);
}
