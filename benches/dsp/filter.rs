//! Benchmarks for the master lowpass.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use ivory::dsp::filter::SVFilter;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Sawtooth-like ramp
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();
        let mut output = vec![0.0f32; size];

        for cutoff in [1_000.0, 20_000.0] {
            let mut filter = SVFilter::lowpass(cutoff);
            group.bench_with_input(
                BenchmarkId::new(format!("lowpass_{}hz", cutoff as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        filter.process(black_box(&input), black_box(&mut output), black_box(48_000.0));
                    })
                },
            );
        }

        // Cutoff moved every block, as when the filter control is dragged
        let mut filter = SVFilter::lowpass(1_000.0);
        let mut cutoff = 1_000.0;
        group.bench_with_input(BenchmarkId::new("lowpass_sweep", size), &size, |b, _| {
            b.iter(|| {
                cutoff = if cutoff > 10_000.0 { 1_000.0 } else { cutoff * 1.1 };
                filter.set_cutoff(cutoff);
                filter.process(black_box(&input), black_box(&mut output), black_box(48_000.0));
            })
        });
    }

    group.finish();
}
