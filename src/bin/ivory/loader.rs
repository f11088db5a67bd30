//! Background asset loading
//!
//! Builds the reverb kernel and decodes every preloaded sample off the audio
//! thread, then hands each finished resource to the engine as a `Control`.
//! Failures are logged and skipped; the instrument plays without them.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use ivory::{
    dsp::reverb::Convolver,
    error::AssetError,
    io::decode::{build_impulse, load_sample},
    Control, EngineConfig,
};
use rtrb::{Producer, PushError};
use tracing::{info, warn};

/// Counters shared with the UI.
#[derive(Debug, Default)]
pub struct LoadProgress {
    pub total: AtomicUsize,
    pub loaded: AtomicUsize,
    pub failed: AtomicUsize,
}

impl LoadProgress {
    pub fn snapshot(&self) -> (usize, usize, usize) {
        (
            self.loaded.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}

pub fn spawn(
    config: EngineConfig,
    sample_rate: f32,
    tx: Producer<Control>,
    progress: Arc<LoadProgress>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut tx = tx;
        load_reverb(&config, sample_rate, &mut tx);
        load_samples(&config, &mut tx, &progress);
    })
}

fn load_reverb(config: &EngineConfig, sample_rate: f32, tx: &mut Producer<Control>) {
    let mut rng = rand::thread_rng();
    match build_impulse(&config.impulse, sample_rate, &mut rng) {
        Ok(Some(ir)) if !ir.is_empty() => {
            let convolver = Convolver::new(&ir);
            info!(frames = ir.len(), partitions = convolver.partitions(), "Reverb ready");
            send(tx, Control::Reverb(Box::new(convolver)));
        }
        Ok(_) => info!("Reverb disabled"),
        Err(e) => warn!(error = %e, "Impulse response failed to load, reverb bypassed"),
    }
}

fn load_samples(config: &EngineConfig, tx: &mut Producer<Control>, progress: &LoadProgress) {
    let total = config
        .sound_banks
        .iter()
        .map(|bank| bank.preload_keys().len())
        .sum();
    progress.total.store(total, Ordering::Relaxed);

    for bank in &config.sound_banks {
        let keys = bank.preload_keys();
        for (i, &key) in keys.iter().enumerate() {
            let location = bank.url_for(key);
            match load_sample(&location) {
                Ok(buffer) => {
                    progress.loaded.fetch_add(1, Ordering::Relaxed);
                    let sent = send(
                        tx,
                        Control::Sample {
                            bank: bank.name.clone(),
                            key,
                            buffer: Arc::new(buffer),
                        },
                    );
                    if !sent {
                        return;
                    }
                }
                Err(AssetError::UnsupportedLocation(location)) => {
                    // The whole bank shares one base location.
                    warn!(bank = %bank.name, location = %location, "Sample bank is not on disk, skipping it");
                    progress.failed.fetch_add(keys.len() - i, Ordering::Relaxed);
                    break;
                }
                Err(e) => {
                    progress.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(bank = %bank.name, key = %key, error = %e, "Sample failed to load");
                }
            }
        }
        info!(bank = %bank.name, "Sample bank loaded");
    }
}

/// Push, waiting while the ring is full. Returns false once the audio side
/// has gone away.
fn send(tx: &mut Producer<Control>, control: Control) -> bool {
    let mut control = control;
    loop {
        if tx.is_abandoned() {
            return false;
        }
        match tx.push(control) {
            Ok(()) => return true,
            Err(PushError::Full(back)) => {
                control = back;
                thread::sleep(Duration::from_millis(5));
            }
        }
    }
}
