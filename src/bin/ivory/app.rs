//! Audio setup: cpal stream, ring buffers, engine on the audio thread

use std::sync::Arc;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ivory::{io::AudioOutput, synth::Notification, Control, Engine, EngineConfig, MAX_BLOCK_SIZE};
use ratatui::DefaultTerminal;
use rtrb::{PushError, RingBuffer};
use tracing::{error, info};

use crate::{
    loader::{self, LoadProgress},
    ui::{PianoApp, UiInit},
};

// Tunables
const CONTROL_RING_LEN: usize = 256;
const ASSET_RING_LEN: usize = 64;
const NOTIFICATION_RING_LEN: usize = 512;
const SCOPE_BLOCK_LEN: usize = 1024;
const SCOPE_RING_BLOCKS: usize = 16;

pub fn run(mut terminal: DefaultTerminal, config: EngineConfig, octave: i32) -> EyreResult<()> {
    // --- Set up CPAL ---

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let stream_config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = stream_config.sample_rate().0 as f32;
    let channels = stream_config.channels() as usize;
    info!(sample_rate, channels, "Audio device opened");

    // --- Cross-thread rings ---
    let (control_tx, mut control_rx) = RingBuffer::<Control>::new(CONTROL_RING_LEN);
    let (asset_tx, mut asset_rx) = RingBuffer::<Control>::new(ASSET_RING_LEN);
    let (mut note_tx, note_rx) = RingBuffer::<Notification>::new(NOTIFICATION_RING_LEN);
    let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_BLOCK_LEN * SCOPE_RING_BLOCKS);

    let mut engine = Engine::new(&config, sample_rate);
    let mut output = if channels == 1 {
        AudioOutput::mono(MAX_BLOCK_SIZE)
    } else {
        AudioOutput::stereo(MAX_BLOCK_SIZE)
    };

    let stream = device
        .build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _| {
                engine.drain_controls(&mut control_rx);
                engine.drain_controls(&mut asset_rx);

                let total_frames = data.len() / channels;
                let mut frames_written = 0;
                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    output.resize(frames_to_render);
                    engine.process_block(&mut output);

                    let last = output.buffers.len() - 1;
                    let out_off = frames_written * channels;
                    for i in 0..frames_to_render {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = output.buffers[ch.min(last)][i];
                        }
                    }

                    // Left channel to the scope, dropped on overflow
                    for &s in &output.buffers[0][..frames_to_render] {
                        if let Err(PushError::Full(_)) = scope_tx.push(s) {
                            break;
                        }
                    }

                    frames_written += frames_to_render;
                }

                for note in engine.drain_notifications() {
                    let _ = note_tx.push(note);
                }
            },
            move |err| error!(error = %err, "Stream error"),
            None,
        )
        .wrap_err("failed to build output stream")?;

    stream.play().wrap_err("failed to start output stream")?;

    // --- Assets ---
    let progress = Arc::new(LoadProgress::default());
    let _loader = loader::spawn(config.clone(), sample_rate, asset_tx, Arc::clone(&progress));

    // --- UI ---
    let init = UiInit {
        sample_rate,
        topology: config.topology,
        params: config.parameters.clamped(config.max_delay_time),
        max_delay_time: config.max_delay_time,
        waveform: config.waveform,
        sound_bank: config.sound_bank.clone(),
        bank_names: config.sound_banks.iter().map(|b| b.name.clone()).collect(),
        base_octave: octave,
    };
    let mut app = PianoApp::new(init, control_tx, note_rx, scope_rx, progress);
    app.run(&mut terminal)
}
