//! Benchmarks for curve waveshaping.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use ivory::dsp::distortion::{fill_distortion_curve, WaveShaper, CURVE_LENGTH};

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut output = vec![0.0f32; size];

        for amount in [0.0, 50.0] {
            let shaper = WaveShaper::new(amount);
            group.bench_with_input(
                BenchmarkId::new(format!("shape_k{}", amount as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        shaper.process(black_box(&input), black_box(&mut output));
                    })
                },
            );
        }
    }

    // Rebuilding the curve is what a distortion change costs
    let mut curve = vec![0.0f32; CURVE_LENGTH];
    group.bench_function("fill_curve", |b| {
        b.iter(|| fill_distortion_curve(black_box(&mut curve), black_box(25.0)))
    });

    group.finish();
}
