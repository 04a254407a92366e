//! Benchmarks for the render and export hot paths.
//!
//! Run with: cargo bench -p ratiocut-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use ratiocut_core::adjust::{self, auto_balance, AutoBalanceMode};
use ratiocut_core::export::encode;
use ratiocut_core::geometry::{compute_initial_rect, ImageSize};
use ratiocut_core::thumbnail::downsize;
use ratiocut_core::{AdjustmentState, AspectRatio, Config, ProcessingPipeline, RasterImage, RgbBalance};

fn source(width: u32, height: u32) -> RasterImage {
    RasterImage::new(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    }))
}

fn edited() -> AdjustmentState {
    AdjustmentState {
        brightness: 1.2,
        contrast: 1.1,
        saturation: 1.3,
        sharpness: 1.5,
        temperature: 20,
        rgb_balance: RgbBalance::new(5, 0, -5),
    }
}

fn benchmark_adjust(c: &mut Criterion) {
    let img = source(1920, 1080);
    let state = edited();

    c.bench_function("adjust_1080p_all_fields", |b| {
        b.iter(|| {
            let _ = adjust::apply(black_box(&img), black_box(&state));
        })
    });
}

fn benchmark_auto_balance(c: &mut Criterion) {
    let img = source(1920, 1080);
    for mode in AutoBalanceMode::ALL {
        c.bench_function(&format!("auto_balance_{mode}"), |b| {
            b.iter(|| auto_balance(black_box(&img), mode))
        });
    }
}

fn benchmark_render(c: &mut Criterion) {
    let img = source(3000, 2000);
    let pipeline = ProcessingPipeline::new(&Config::default());
    let crop = match compute_initial_rect(ImageSize::new(3000, 2000), AspectRatio::LANDSCAPE_16_9) {
        Ok(crop) => crop,
        Err(e) => panic!("benchmark crop: {e}"),
    };
    let state = edited();

    c.bench_function("render_16x9_to_1080p", |b| {
        b.iter(|| {
            let _ = pipeline.render(black_box(&img), &crop, Some(1920), &state);
        })
    });
}

fn benchmark_encode(c: &mut Criterion) {
    let img = source(1280, 720);

    c.bench_function("webp_encode_720p_q95_m6", |b| {
        b.iter(|| {
            let _ = encode(black_box(&img), 95, 6);
        })
    });
}

fn benchmark_thumbnail(c: &mut Criterion) {
    let img = source(1920, 1080);

    c.bench_function("thumbnail_256px", |b| {
        b.iter(|| downsize(black_box(&img), 256))
    });
}

criterion_group!(
    benches,
    benchmark_adjust,
    benchmark_auto_balance,
    benchmark_render,
    benchmark_encode,
    benchmark_thumbnail,
);
criterion_main!(benches);
