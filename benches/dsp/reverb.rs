//! Benchmarks for partitioned convolution.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use ivory::dsp::reverb::{Convolver, ImpulseResponse};
use rand::{rngs::StdRng, SeedableRng};

use crate::BLOCK_SIZES;

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");
    let sample_rate = 48_000.0;
    let mut rng = StdRng::seed_from_u64(1);

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| {
                if i < 10 {
                    1.0 - (i as f32 / 10.0) // Initial impulse
                } else {
                    (i as f32 * 0.05).sin() * 0.1 // Quiet tail
                }
            })
            .collect();
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        for seconds in [0.5, 2.0] {
            let ir = ImpulseResponse::synthetic(seconds, sample_rate, &mut rng);
            let mut convolver = Convolver::new(&ir);
            group.bench_with_input(
                BenchmarkId::new(format!("convolve_{seconds}s"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        convolver.process(
                            black_box(&input),
                            black_box(&mut left),
                            black_box(&mut right),
                        );
                    })
                },
            );
        }
    }

    // Building the convolver happens off the audio thread when an impulse loads
    let ir = ImpulseResponse::synthetic(2.0, sample_rate, &mut rng);
    group.bench_function("build_2s", |b| b.iter(|| Convolver::new(black_box(&ir))));

    group.finish();
}
