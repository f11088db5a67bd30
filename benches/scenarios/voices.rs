//! Benchmarks for held chords in the voice manager.
//!
//! Voices are summed into the bus exactly as the engine does it, so these
//! numbers are the per-block cost before any effect runs.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use ivory::{
    dsp::oscillator::Waveform,
    graph::node::{GraphNode, RenderCtx},
    synth::{factory::{SynthPatch, VoiceFactory}, VoiceManager, VoiceRequest},
    NoteKey,
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

fn chord(manager: &mut VoiceManager, notes: &[&str]) {
    for note in notes {
        if let Ok(key) = note.parse::<NoteKey>() {
            let _ = manager.start_note(key, VoiceRequest::Synth);
        }
    }
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut voice_bus = vec![0.0f32; size];
        let mut sample_bus = vec![0.0f32; size];

        // A single voice graph, as the factory builds it
        let ctx = RenderCtx::from_freq(SAMPLE_RATE, 261.63);
        let mut single = SynthPatch::default().create_voice();
        single.note_on(&ctx);
        group.bench_with_input(BenchmarkId::new("single_graph", size), &size, |b, _| {
            b.iter(|| single.render_block(black_box(&mut voice_bus), black_box(&ctx)))
        });

        // Triad and a ten finger cluster
        for (name, notes) in [
            ("triad", &["C4", "E4", "G4"][..]),
            (
                "ten_keys",
                &["C3", "G3", "C4", "E4", "G4", "A#4", "C5", "D5", "E5", "G5"][..],
            ),
        ] {
            let mut manager = VoiceManager::new(SAMPLE_RATE, SynthPatch::default(), 0.1);
            chord(&mut manager, notes);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    manager.render(black_box(&mut voice_bus), black_box(&mut sample_bus));
                    manager.drain_notifications().for_each(drop);
                })
            });
        }

        // Sawtooth cluster sliding up and down a semitone every block
        let patch = SynthPatch {
            waveform: Waveform::Sawtooth,
            ..SynthPatch::default()
        };
        let mut manager = VoiceManager::new(SAMPLE_RATE, patch, 0.01);
        let (low, high): (NoteKey, NoteKey) = match ("C4".parse(), "C#4".parse()) {
            (Ok(low), Ok(high)) => (low, high),
            _ => continue,
        };
        let _ = manager.start_note(low, VoiceRequest::Synth);
        let mut up = true;
        group.bench_with_input(BenchmarkId::new("glide", size), &size, |b, _| {
            b.iter(|| {
                let (from, to) = if up { (low, high) } else { (high, low) };
                let _ = manager.retune_note(from, to);
                up = !up;
                manager.render(black_box(&mut voice_bus), black_box(&mut sample_bus));
                manager.drain_notifications().for_each(drop);
            })
        });
    }

    group.finish();
}
