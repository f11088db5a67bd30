use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    dsp::{
        envelope::{release_frames, EnvelopeShape},
        mix::sum_in_place,
        oscillator::Waveform,
    },
    engine::scheduler::{PendingTeardown, Scheduler},
    error::{NoteError, VoiceError},
    graph::{node::RenderCtx, sample::SampleNode},
    io::samples::SampleBuffer,
    notes::NoteKey,
    synth::{
        factory::{SynthPatch, VoiceFactory},
        message::Notification,
        voice::{Voice, VoiceId, VoiceSource, VoiceStage},
    },
    MAX_BLOCK_SIZE,
};

/*
Voice Manager
=============

Owns every sounding key. The map from NoteKey to Voice holds at most one
voice per key at any instant, and every voice it ever held is eventually
retired exactly once.

Per-key lifecycle:

              start_note                 stop_note
  ┌──────┐  ───────────→  ┌───────────┐ ─────────→ ┌───────────┐
  │ Idle │                │ Attacking │            │ Releasing │
  └──────┘                │ Sustained │            └───────────┘
     ↑                    └───────────┘                  │
     │                   retune_note keeps the           │ release_frames
     │                   voice, moves its key            │ later
     └───────────────────────────────────────────────────┘

Time
----
The clock is the number of frames rendered so far. stop_note schedules a
teardown at `now + release_frames(release)`; `render` splits the block at
every due frame so the voice disappears exactly when its envelope hits zero.

Replacement and stale teardowns
-------------------------------
Starting a key that is still sounding (or still releasing) retires the old
voice on the spot. Its pending teardown, if any, stays in the schedule, but
it carries the old VoiceId. When it comes due the map entry belongs to a
different voice, so the teardown is dropped instead of deleting the new
voice.

Sample voices bypass all of this: stopping one removes it immediately.
*/

/// Lifetime counters. `started - retired` always equals the number of
/// voices in the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoiceStats {
    pub started: u64,
    pub retired: u64,
}

/// Timbre for a new voice.
#[derive(Debug, Clone)]
pub enum VoiceRequest {
    /// Oscillator at the key's table frequency.
    Synth,
    /// Play this recording.
    Sample(Arc<SampleBuffer>),
}

pub struct VoiceManager {
    sample_rate: f32,
    voices: HashMap<NoteKey, Voice>,
    teardowns: Scheduler,
    patch: SynthPatch,
    retune_time: f32,

    next_id: u64,
    clock: u64,
    stats: VoiceStats,

    notifications: Vec<Notification>,
    key_scratch: Vec<NoteKey>,
    render_scratch: Vec<f32>,
}

impl VoiceManager {
    pub fn new(sample_rate: f32, patch: SynthPatch, retune_time: f32) -> Self {
        Self {
            sample_rate,
            voices: HashMap::with_capacity(128),
            teardowns: Scheduler::new(),
            patch,
            retune_time,
            next_id: 0,
            clock: 0,
            stats: VoiceStats::default(),
            notifications: Vec::with_capacity(256),
            key_scratch: Vec::with_capacity(128),
            render_scratch: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Start `key` from the selected timbre, replacing any voice it has.
    pub fn start_note(
        &mut self,
        key: NoteKey,
        request: VoiceRequest,
    ) -> Result<VoiceId, VoiceError> {
        match request {
            VoiceRequest::Synth => self.start_tone(key, key.frequency()),
            VoiceRequest::Sample(buffer) => {
                let source = VoiceSource::Sample(SampleNode::new(buffer));
                Ok(self.install(key, 0.0, source))
            }
        }
    }

    /// Start a synthesized voice for `key` at an explicit frequency.
    ///
    /// Non-finite or non-positive frequencies are rejected before anything
    /// is touched.
    pub fn start_tone(&mut self, key: NoteKey, hz: f32) -> Result<VoiceId, VoiceError> {
        if !(hz.is_finite() && hz > 0.0) {
            warn!(key = %key, hz, "Rejected note start with invalid frequency");
            return Err(NoteError::InvalidFrequency(hz).into());
        }

        let source = VoiceSource::Synth(self.patch.create_voice());
        Ok(self.install(key, hz, source))
    }

    fn install(&mut self, key: NoteKey, hz: f32, source: VoiceSource) -> VoiceId {
        self.force_finish(key);

        let id = VoiceId(self.next_id);
        self.next_id += 1;

        let ctx = RenderCtx::from_freq(self.sample_rate, hz);
        let voice = Voice::start(id, key, self.clock, ctx, source);
        let sample = voice.is_sample();
        self.voices.insert(key, voice);
        self.stats.started += 1;

        debug!(key = %key, id = %id, hz, sample, "Voice started");
        self.notifications.push(Notification::NoteOn(key));
        id
    }

    /// Drop the voice on `key` right now, whatever its stage.
    fn force_finish(&mut self, key: NoteKey) {
        if let Some(old) = self.voices.remove(&key) {
            self.stats.retired += 1;
            debug!(key = %key, id = %old.id(), "Voice replaced");
            if !old.is_released() {
                self.notifications.push(Notification::NoteOff(key));
            }
        }
    }

    /// Release `key`. Returns false when there was nothing to release.
    pub fn stop_note(&mut self, key: NoteKey) -> bool {
        let Some(voice) = self.voices.get_mut(&key) else {
            return false;
        };
        if voice.is_released() {
            return false;
        }

        if voice.is_sample() {
            let id = voice.id();
            self.voices.remove(&key);
            self.stats.retired += 1;
            debug!(key = %key, id = %id, "Sample voice stopped");
        } else {
            voice.release(self.patch.release);
            let due = self.clock + release_frames(self.patch.release, self.sample_rate);
            self.teardowns.schedule(PendingTeardown {
                key,
                id: voice.id(),
                due,
            });
            debug!(key = %key, id = %voice.id(), due, "Voice releasing");
        }

        self.notifications.push(Notification::NoteOff(key));
        true
    }

    /// Move the held voice on `from` to `to`, gliding its pitch.
    ///
    /// Only synthesized voices that have not been released can be retuned.
    /// A voice already sounding on `to` is retired first.
    pub fn retune_note(&mut self, from: NoteKey, to: NoteKey) -> Result<(), VoiceError> {
        if from == to {
            return Ok(());
        }

        let voice = self.voices.get(&from).ok_or(VoiceError::NoVoice(from))?;
        if voice.is_sample() || voice.is_released() {
            return Err(VoiceError::NotRetunable(from));
        }

        self.force_finish(to);

        let Some(mut voice) = self.voices.remove(&from) else {
            return Err(VoiceError::NoVoice(from));
        };
        let frames = (self.retune_time.max(0.0) * self.sample_rate).round() as u32;
        voice.retune(to, to.frequency(), frames);
        debug!(from = %from, to = %to, id = %voice.id(), "Voice retuned");
        self.voices.insert(to, voice);

        self.notifications
            .push(Notification::NoteRetuned { from, to });
        Ok(())
    }

    /// Release every voice that is not already releasing.
    pub fn all_stop(&mut self) {
        let mut keys = std::mem::take(&mut self.key_scratch);
        keys.clear();
        keys.extend(
            self.voices
                .values()
                .filter(|v| !v.is_released())
                .map(|v| v.key()),
        );
        for &key in &keys {
            self.stop_note(key);
        }
        self.key_scratch = keys;
    }

    /// Report the key under an idle pointer.
    pub fn hover(&mut self, key: Option<NoteKey>) {
        self.notifications.push(Notification::Hovered(key));
    }

    /// Render one block. Synthesized voices are summed into `voice_bus`,
    /// sample voices into `sample_bus`; both are overwritten.
    pub fn render(&mut self, voice_bus: &mut [f32], sample_bus: &mut [f32]) {
        debug_assert_eq!(voice_bus.len(), sample_bus.len());
        debug_assert!(voice_bus.len() <= MAX_BLOCK_SIZE);

        voice_bus.fill(0.0);
        sample_bus.fill(0.0);

        let frames = voice_bus.len();
        let mut offset = 0;
        loop {
            self.run_due_teardowns();
            if offset == frames {
                break;
            }

            let remaining = frames - offset;
            let chunk = match self.teardowns.next_due() {
                Some(due) => ((due - self.clock) as usize).min(remaining),
                None => remaining,
            };

            let range = offset..offset + chunk;
            self.render_chunk(&mut voice_bus[range.clone()], &mut sample_bus[range]);
            offset += chunk;
            self.clock += chunk as u64;
        }
    }

    fn render_chunk(&mut self, voice_bus: &mut [f32], sample_bus: &mut [f32]) {
        let scratch = &mut self.render_scratch[..voice_bus.len()];
        for voice in self.voices.values_mut() {
            voice.render(scratch);
            let bus = if voice.is_sample() {
                &mut *sample_bus
            } else {
                &mut *voice_bus
            };
            sum_in_place(bus, scratch);
        }
    }

    fn run_due_teardowns(&mut self) {
        while let Some(teardown) = self.teardowns.pop_due(self.clock) {
            let owned = self
                .voices
                .get(&teardown.key)
                .is_some_and(|v| v.id() == teardown.id);

            if owned {
                self.voices.remove(&teardown.key);
                self.stats.retired += 1;
                debug!(key = %teardown.key, id = %teardown.id, "Voice torn down");
            } else {
                debug!(key = %teardown.key, id = %teardown.id, "Stale teardown skipped");
            }
        }
    }

    /// Take every notification emitted since the last drain.
    pub fn drain_notifications(&mut self) -> std::vec::Drain<'_, Notification> {
        self.notifications.drain(..)
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.patch.waveform = waveform;
    }

    pub fn set_envelope_shape(&mut self, shape: EnvelopeShape) {
        self.patch.shape = shape;
    }

    /// Attack used by voices started from now on.
    pub fn set_attack(&mut self, attack: f32) {
        self.patch.attack = attack;
    }

    /// Release used by stops issued from now on.
    pub fn set_release(&mut self, release: f32) {
        self.patch.release = release;
    }

    pub fn set_retune_time(&mut self, seconds: f32) {
        self.retune_time = seconds;
    }

    pub fn patch(&self) -> &SynthPatch {
        &self.patch
    }

    pub fn voice(&self, key: NoteKey) -> Option<&Voice> {
        self.voices.get(&key)
    }

    pub fn contains(&self, key: NoteKey) -> bool {
        self.voices.contains_key(&key)
    }

    pub fn stage(&self, key: NoteKey) -> Option<VoiceStage> {
        self.voices.get(&key).map(Voice::stage)
    }

    pub fn active_keys(&self) -> impl Iterator<Item = NoteKey> + '_ {
        self.voices.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn stats(&self) -> VoiceStats {
        self.stats
    }

    /// Frames rendered so far.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn pending_teardowns(&self) -> usize {
        self.teardowns.len()
    }
}
