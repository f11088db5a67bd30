//! Benchmarks for delay line operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use ivory::dsp::delay::DelayLine;

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Delay times in samples
    let delay_times: &[usize] = &[
        480,    // 10ms at 48kHz
        4800,   // 100ms at 48kHz
        48000,  // 1 second at 48kHz
    ];

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut output = vec![0.0f32; size];

        for &delay_samples in delay_times {
            let delay_ms = delay_samples as f32 / 48.0;

            let mut delay = DelayLine::new(5.0, 48_000.0);
            delay.set_delay(delay_samples);
            group.bench_with_input(
                BenchmarkId::new(format!("process_{}ms", delay_ms as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        delay.process(black_box(&input), black_box(&mut output));
                    })
                },
            );
        }
    }

    group.finish();
}
