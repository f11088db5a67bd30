pub mod effects;
pub mod params;
pub mod scheduler;

use std::sync::Arc;

use tracing::{info, warn};

use self::{
    effects::EffectsGraph,
    params::{clamp_param, distortion_k, filter_cutoff_hz, EffectsParameters},
};
use crate::{
    config::{EngineConfig, Topology},
    dsp::{
        envelope::EnvelopeShape,
        oscillator::Waveform,
        reverb::{Convolver, ImpulseResponse},
    },
    error::VoiceError,
    input::{InputEvent, InputMapper, NoteControl},
    io::{
        samples::{SampleBuffer, SampleLibrary, SoundBank},
        AudioOutput,
    },
    notes::NoteKey,
    synth::{
        factory::SynthPatch, message::MessageReceiver, Notification, VoiceId, VoiceManager,
        VoiceRequest,
    },
    MAX_BLOCK_SIZE,
};

/*
Engine
======

The one object that owns all instrument state: the voice map, the effects
graph, the shared parameters, the input mapper and the loaded samples. It is
built once at startup and dropped on shutdown; nothing lives in globals.

On the audio thread the engine is driven in two steps per callback:

  drain_controls   UI commands and loaded assets, applied in arrival order
  process_block    voices → voice/sample buses → effects graph → output

Assets loaded on another thread arrive as `Control::Reverb` and
`Control::Sample`. A note started before its asset lands plays without it:
no reverb colour yet, or silence for a missing sample.
*/

/// Commands for the engine, typically sent over a ring buffer.
#[derive(Debug)]
pub enum Control {
    NoteOn(NoteKey),
    NoteOff(NoteKey),
    Retune { from: NoteKey, to: NoteKey },
    AllStop,
    Input(InputEvent),

    MasterVolume(f32),
    ReverbMix(f32),
    DelayTime(f32),
    Distortion(f32),
    FilterCutoff(f32),
    Attack(f32),
    Release(f32),
    Waveform(Waveform),
    SoundBank(SoundBank),

    /// Ready-built reverb kernel.
    Reverb(Box<Convolver>),
    /// One decoded note recording.
    Sample {
        bank: String,
        key: NoteKey,
        buffer: Arc<SampleBuffer>,
    },
}

pub struct Engine {
    sample_rate: f32,
    max_delay_time: f32,
    params: EffectsParameters,
    sound_bank: SoundBank,

    voices: VoiceManager,
    effects: EffectsGraph,
    input: InputMapper,
    samples: SampleLibrary,

    voice_bus: Vec<f32>,
    sample_bus: Vec<f32>,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl Engine {
    /// Build the engine. The reverb stays silent until an impulse response
    /// is installed.
    pub fn new(config: &EngineConfig, sample_rate: f32) -> Self {
        let max_delay_time = config.max_delay_time.max(0.0);
        let params = config.parameters.clamped(max_delay_time);

        let patch = SynthPatch {
            waveform: config.waveform,
            shape: config.envelope,
            attack: params.attack,
            release: params.release,
        };

        info!(
            topology = ?config.topology,
            sample_rate,
            sound_bank = %config.sound_bank,
            "Engine created"
        );

        Self {
            sample_rate,
            max_delay_time,
            params,
            sound_bank: config.sound_bank.clone(),
            voices: VoiceManager::new(sample_rate, patch, config.retune_time),
            effects: EffectsGraph::new(config.topology, sample_rate, max_delay_time, &params),
            input: InputMapper::new(),
            samples: SampleLibrary::new(),
            voice_bus: vec![0.0; MAX_BLOCK_SIZE],
            sample_bus: vec![0.0; MAX_BLOCK_SIZE],
            left: vec![0.0; MAX_BLOCK_SIZE],
            right: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn topology(&self) -> Topology {
        self.effects.topology()
    }

    pub fn params(&self) -> &EffectsParameters {
        &self.params
    }

    pub fn sound_bank(&self) -> &SoundBank {
        &self.sound_bank
    }

    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    pub fn effects(&self) -> &EffectsGraph {
        &self.effects
    }

    pub fn input(&self) -> &InputMapper {
        &self.input
    }

    pub fn samples(&self) -> &SampleLibrary {
        &self.samples
    }

    // Note operations

    /// Start `key` with the selected sound bank.
    pub fn start_note(&mut self, key: NoteKey) -> Result<VoiceId, VoiceError> {
        self.player().start(key)
    }

    /// Start a synthesized voice at a raw frequency.
    pub fn start_tone(&mut self, key: NoteKey, hz: f32) -> Result<VoiceId, VoiceError> {
        self.voices.start_tone(key, hz)
    }

    pub fn stop_note(&mut self, key: NoteKey) -> bool {
        self.voices.stop_note(key)
    }

    pub fn retune_note(&mut self, from: NoteKey, to: NoteKey) -> Result<(), VoiceError> {
        self.voices.retune_note(from, to)
    }

    pub fn all_stop(&mut self) {
        self.voices.all_stop();
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        let Self {
            input,
            voices,
            samples,
            sound_bank,
            ..
        } = self;
        let mut player = NotePlayer {
            voices,
            samples,
            sound_bank,
        };
        input.handle(event, &mut player);
    }

    fn player(&mut self) -> NotePlayer<'_> {
        NotePlayer {
            voices: &mut self.voices,
            samples: &self.samples,
            sound_bank: &self.sound_bank,
        }
    }

    // Parameters. Out-of-range values are clamped, NaN is ignored.

    pub fn set_master_volume(&mut self, volume: f32) {
        if let Some(v) = clamp_param("master_volume", volume, EffectsParameters::UNIT_RANGE) {
            self.params.master_volume = v;
            self.effects.set_master_volume(v);
        }
    }

    pub fn set_reverb_mix(&mut self, mix: f32) {
        if let Some(v) = clamp_param("reverb_mix", mix, EffectsParameters::UNIT_RANGE) {
            self.params.reverb_mix = v;
            self.effects.set_reverb_gain(v);
        }
    }

    pub fn set_delay_time(&mut self, seconds: f32) {
        if let Some(v) = clamp_param("delay_time", seconds, 0.0..=self.max_delay_time) {
            self.params.delay_time = v;
            self.effects.set_delay_time(v);
        }
    }

    pub fn set_distortion(&mut self, amount: f32) {
        if let Some(v) = clamp_param("distortion", amount, EffectsParameters::UNIT_RANGE) {
            self.params.distortion = v;
            self.effects.set_distortion_k(distortion_k(v));
        }
    }

    pub fn set_filter_cutoff(&mut self, normalized: f32) {
        if let Some(v) = clamp_param("filter_cutoff", normalized, EffectsParameters::UNIT_RANGE) {
            self.params.filter_cutoff = v;
            self.effects.set_filter_hz(filter_cutoff_hz(v));
        }
    }

    /// Applies to voices started from now on.
    pub fn set_attack(&mut self, seconds: f32) {
        if let Some(v) = clamp_param("attack", seconds, EffectsParameters::ATTACK_RANGE) {
            self.params.attack = v;
            self.voices.set_attack(v);
        }
    }

    /// Applies to the next stop of any voice.
    pub fn set_release(&mut self, seconds: f32) {
        if let Some(v) = clamp_param("release", seconds, EffectsParameters::RELEASE_RANGE) {
            self.params.release = v;
            self.voices.set_release(v);
        }
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        info!(waveform = %waveform, "Waveform changed");
        self.voices.set_waveform(waveform);
    }

    pub fn set_envelope_shape(&mut self, shape: EnvelopeShape) {
        self.voices.set_envelope_shape(shape);
    }

    /// Select the timbre for notes started from now on. Sounding notes keep
    /// theirs.
    pub fn set_sound_bank(&mut self, bank: SoundBank) {
        info!(bank = %bank, "Sound bank changed");
        self.sound_bank = bank;
    }

    /// Apply a whole parameter set.
    pub fn set_params(&mut self, params: EffectsParameters) {
        let params = params.clamped(self.max_delay_time);
        self.params = params;
        self.effects.apply(&params);
        self.voices.set_attack(params.attack);
        self.voices.set_release(params.release);
    }

    // Assets

    /// Build and install a reverb kernel. An empty response leaves the
    /// branch silent.
    pub fn set_impulse_response(&mut self, ir: &ImpulseResponse) {
        if ir.is_empty() {
            warn!("Empty impulse response, reverb disabled");
            self.effects.clear_convolver();
            return;
        }
        let ir = ir.clone().resampled(self.sample_rate);
        self.set_convolver(Box::new(Convolver::new(&ir)));
    }

    pub fn set_convolver(&mut self, convolver: Box<Convolver>) {
        self.effects.set_convolver(convolver);
    }

    pub fn insert_sample(&mut self, bank: &str, key: NoteKey, buffer: Arc<SampleBuffer>) {
        self.samples.insert(bank, key, buffer);
    }

    // Audio thread

    pub fn apply(&mut self, control: Control) {
        match control {
            Control::NoteOn(key) => {
                // Failures are logged where they happen.
                let _ = self.start_note(key);
            }
            Control::NoteOff(key) => {
                self.stop_note(key);
            }
            Control::Retune { from, to } => {
                let _ = self.retune_note(from, to);
            }
            Control::AllStop => self.all_stop(),
            Control::Input(event) => self.handle_input(event),
            Control::MasterVolume(v) => self.set_master_volume(v),
            Control::ReverbMix(v) => self.set_reverb_mix(v),
            Control::DelayTime(v) => self.set_delay_time(v),
            Control::Distortion(v) => self.set_distortion(v),
            Control::FilterCutoff(v) => self.set_filter_cutoff(v),
            Control::Attack(v) => self.set_attack(v),
            Control::Release(v) => self.set_release(v),
            Control::Waveform(w) => self.set_waveform(w),
            Control::SoundBank(bank) => self.set_sound_bank(bank),
            Control::Reverb(convolver) => self.set_convolver(convolver),
            Control::Sample { bank, key, buffer } => self.insert_sample(&bank, key, buffer),
        }
    }

    /// Apply every pending control.
    pub fn drain_controls(&mut self, rx: &mut impl MessageReceiver<Control>) {
        while let Some(control) = rx.pop() {
            self.apply(control);
        }
    }

    /// Render into every buffer of `output`, in blocks of at most
    /// `MAX_BLOCK_SIZE` frames.
    pub fn process_block(&mut self, output: &mut AudioOutput) {
        let frames = output.frames();
        let mut offset = 0;

        while offset < frames {
            let n = (frames - offset).min(MAX_BLOCK_SIZE);
            let voice_bus = &mut self.voice_bus[..n];
            let sample_bus = &mut self.sample_bus[..n];
            let left = &mut self.left[..n];
            let right = &mut self.right[..n];

            self.voices.render(voice_bus, sample_bus);
            self.effects.process(voice_bus, sample_bus, left, right);
            output.write(offset, left, right);

            offset += n;
        }
    }

    pub fn drain_notifications(&mut self) -> std::vec::Drain<'_, Notification> {
        self.voices.drain_notifications()
    }
}

/// Borrow of the engine parts the input mapper drives.
pub struct NotePlayer<'a> {
    voices: &'a mut VoiceManager,
    samples: &'a SampleLibrary,
    sound_bank: &'a SoundBank,
}

impl NotePlayer<'_> {
    fn start(&mut self, key: NoteKey) -> Result<VoiceId, VoiceError> {
        let request = match self.sound_bank {
            SoundBank::Synth => VoiceRequest::Synth,
            SoundBank::Samples(bank) => VoiceRequest::Sample(self.samples.get(bank, key)?),
        };
        self.voices.start_note(key, request)
    }
}

impl NoteControl for NotePlayer<'_> {
    fn start_note(&mut self, key: NoteKey) -> Result<(), VoiceError> {
        self.start(key).map(|_| ())
    }

    fn stop_note(&mut self, key: NoteKey) {
        self.voices.stop_note(key);
    }

    fn retune_note(&mut self, from: NoteKey, to: NoteKey) -> Result<(), VoiceError> {
        self.voices.retune_note(from, to)
    }

    fn all_stop(&mut self) {
        self.voices.all_stop();
    }

    fn hover(&mut self, key: Option<NoteKey>) {
        self.voices.hover(key);
    }
}
