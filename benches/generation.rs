//! Benchmarks for city planning, chunk generation and shadow casting.
//!
//! Run with: cargo bench --bench generation

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use pixel_sprawl::procgen::generator::ChunkGenerator;
use pixel_sprawl::procgen::plan::CityPlan;
use pixel_sprawl::world::coords::ChunkKey;
use pixel_sprawl::{TerrainWorld, Theme, WorldConfig};

fn benchmark_city_plan(c: &mut Criterion) {
    let theme = Theme::city();
    c.bench_function("city_plan_1024", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(CityPlan::build(seed, &theme, 1024, 1024))
        });
    });
}

fn benchmark_chunk_generation(c: &mut Criterion) {
    let gen = ChunkGenerator::new(42, Theme::city(), 1024, 1024);

    c.bench_function("single_chunk_generation", |b| {
        let mut i = 0i32;
        b.iter(|| {
            i = (i + 1) % 256;
            black_box(gen.generate(ChunkKey::new(i % 16, i / 16)))
        });
    });

    let mut group = c.benchmark_group("chunk_grid");
    group.throughput(Throughput::Elements(16 * 16));
    group.sample_size(10);
    group.bench_function("16x16_chunks", |b| {
        b.iter(|| {
            for cy in 0..16 {
                for cx in 0..16 {
                    black_box(gen.generate(ChunkKey::new(cx, cy)));
                }
            }
        });
    });
    group.finish();
}

fn benchmark_shadows(c: &mut Criterion) {
    let mut world = TerrainWorld::new(WorldConfig {
        seed: 42,
        width: 512,
        height: 512,
        ..WorldConfig::default()
    });
    world.generate_all();

    c.bench_function("chunk_shadow_recompute", |b| {
        b.iter(|| black_box(world.refresh_shadows(ChunkKey::new(3, 3))));
    });
}

criterion_group!(
    benches,
    benchmark_city_plan,
    benchmark_chunk_generation,
    benchmark_shadows
);
criterion_main!(benches);
