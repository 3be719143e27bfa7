//! Benchmark for noise and per-tile vein generation.
//!
//! Run with: cargo bench --package deepshaft_world --bench noise_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use deepshaft_world::{OreTable, SimplexNoise, TilePos, VeinGenerator, WorldSeed, ZoneTable};

fn benchmark_single_sample(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    c.bench_function("single_noise_sample", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.sample(black_box(x), black_box(x * 0.7)))
        });
    });
}

fn benchmark_octaved_noise(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    c.bench_function("octaved_noise_3_octaves", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.octaved(black_box(x), black_box(x * 0.7), 3, 0.5, 2.0))
        });
    });
}

fn benchmark_vein_tiles(c: &mut Criterion) {
    let generator = VeinGenerator::new(WorldSeed::new(42));
    let zones = ZoneTable::default();
    let ores = OreTable::default();

    let mut group = c.benchmark_group("vein_generation");
    group.throughput(Throughput::Elements(100 * 100));

    // One default-width shaft, 100 rows, crossing three zones.
    group.bench_function("100x100_tiles", |b| {
        b.iter(|| {
            for y in 0..100 {
                let zone = zones.zone_for(y * 5);
                for x in 0..100 {
                    black_box(generator.generate(TilePos::new(x, y * 5), zone, &ores));
                }
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_sample,
    benchmark_octaved_noise,
    benchmark_vein_tiles
);

criterion_main!(benches);
