//! Benchmarks for the whole engine: voices through the effects graph.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use ivory::{
    dsp::reverb::{Convolver, ImpulseResponse},
    io::AudioOutput,
    Engine, EngineConfig, NoteKey,
};
use rand::{rngs::StdRng, SeedableRng};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;
const CHORD: [&str; 4] = ["C4", "E4", "G4", "B4"];

fn engine(config: &EngineConfig) -> Engine {
    let mut engine = Engine::new(config, SAMPLE_RATE);
    for note in CHORD {
        if let Ok(key) = note.parse::<NoteKey>() {
            let _ = engine.start_note(key);
        }
    }
    engine
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");
    let mut rng = StdRng::seed_from_u64(3);
    let ir = ImpulseResponse::synthetic(2.0, SAMPLE_RATE, &mut rng);

    for &size in BLOCK_SIZES {
        let mut output = AudioOutput::stereo(size);

        // Dry chain: master gain only
        let mut minimal = engine(&EngineConfig::minimal());
        group.bench_with_input(BenchmarkId::new("minimal", size), &size, |b, _| {
            b.iter(|| {
                minimal.process_block(black_box(&mut output));
                minimal.drain_notifications().for_each(drop);
            })
        });

        // Every branch engaged
        let mut full = engine(&EngineConfig::default());
        full.set_convolver(Box::new(Convolver::new(&ir)));
        full.set_reverb_mix(0.4);
        full.set_delay_time(0.25);
        full.set_distortion(0.3);
        full.set_filter_cutoff(0.6);
        group.bench_with_input(BenchmarkId::new("full", size), &size, |b, _| {
            b.iter(|| {
                full.process_block(black_box(&mut output));
                full.drain_notifications().for_each(drop);
            })
        });
    }

    group.finish();
}
