//! Benchmarks for particle grid generation and CPU frame evaluation.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use depthcloud::layout;
use depthcloud::noise::{curl3, CURL_EPSILON};
use depthcloud::program::{evaluate_frame, FrameStats};
use depthcloud::{FrameParams, FrameSnapshot, OrbitCamera, SourceMaps, TextureConfig, Vec2, Vec3};

fn gradient_maps(size: u32) -> SourceMaps {
    let mut color = Vec::with_capacity((size * size * 4) as usize);
    let mut depth = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let c = (x * 255 / size) as u8;
            let d = (y * 255 / size) as u8;
            color.extend_from_slice(&[c, 200 - c / 2, 90, 255]);
            depth.extend_from_slice(&[d, d, d, 255]);
        }
    }
    SourceMaps::new(
        TextureConfig::from_rgba(color, size, size).unwrap(),
        TextureConfig::from_rgba(depth, size, size).unwrap(),
    )
    .unwrap()
}

fn snapshot(params: FrameParams) -> FrameSnapshot {
    let camera = OrbitCamera::new();
    FrameSnapshot::new(
        params,
        1.5,
        camera.view_matrix(),
        camera.projection(16.0 / 9.0),
        Vec2::new(1920.0, 1080.0),
    )
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");

    for grid in [64u32, 140, 280] {
        group.bench_with_input(BenchmarkId::new("generate", grid), &grid, |b, &grid| {
            let mut rng = StdRng::seed_from_u64(1);
            b.iter(|| black_box(layout::generate_with_rng(grid, &mut rng).unwrap()))
        });
    }

    group.finish();
}

fn bench_noise(c: &mut Criterion) {
    c.bench_function("curl3", |b| {
        let p = Vec3::new(0.3, 0.7, 1.1);
        b.iter(|| black_box(curl3(black_box(p), CURL_EPSILON)))
    });
}

fn bench_evaluate_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_frame");
    let maps = gradient_maps(512);

    for grid in [64u32, 140, 280] {
        let particles = layout::generate_with_rng(grid, &mut StdRng::seed_from_u64(2)).unwrap();

        group.bench_with_input(BenchmarkId::new("default", grid), &particles, |b, particles| {
            let frame = snapshot(FrameParams::default());
            b.iter(|| black_box(evaluate_frame(particles, &maps, &frame)))
        });

        group.bench_with_input(BenchmarkId::new("no_turbulence", grid), &particles, |b, particles| {
            let frame = snapshot(FrameParams {
                curl_strength: 0.0,
                ..Default::default()
            });
            b.iter(|| black_box(evaluate_frame(particles, &maps, &frame)))
        });
    }

    group.finish();
}

fn bench_frame_stats(c: &mut Criterion) {
    let maps = gradient_maps(512);
    let particles = layout::generate_with_rng(280, &mut StdRng::seed_from_u64(3)).unwrap();
    let points = evaluate_frame(&particles, &maps, &snapshot(FrameParams::default()));

    c.bench_function("frame_stats_280", |b| b.iter(|| black_box(FrameStats::from_points(&points))));
}

criterion_group!(
    benches,
    bench_layout,
    bench_noise,
    bench_evaluate_frame,
    bench_frame_stats,
);
criterion_main!(benches);
