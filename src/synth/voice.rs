use std::fmt;

use crate::{
    dsp::envelope::EnvelopeState,
    graph::{
        node::{GraphNode, RenderCtx},
        sample::SampleNode,
        SynthVoice,
    },
    notes::NoteKey,
};

/// Identity of one voice instance.
///
/// Never reused: a key that is restarted gets a new id, so a teardown
/// scheduled for the old voice can tell it no longer owns the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub(crate) u64);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle stage as seen from outside the voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStage {
    Attacking, // Envelope ramping up (attack or decay)
    Sustained, // Holding at the sustain level
    Releasing, // Key released, waiting for teardown
}

/// What produces the sound.
pub enum VoiceSource {
    Synth(SynthVoice),
    Sample(SampleNode),
}

/// A single sounding key
pub struct Voice {
    id: VoiceId,
    key: NoteKey,
    started_at: u64,
    ctx: RenderCtx,
    source: VoiceSource,
    released: bool,
}

impl Voice {
    /// Create the voice and fire its note-on.
    pub(crate) fn start(
        id: VoiceId,
        key: NoteKey,
        started_at: u64,
        ctx: RenderCtx,
        mut source: VoiceSource,
    ) -> Self {
        match &mut source {
            VoiceSource::Synth(graph) => graph.note_on(&ctx),
            VoiceSource::Sample(node) => node.note_on(&ctx),
        }

        Self {
            id,
            key,
            started_at,
            ctx,
            source,
            released: false,
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn key(&self) -> NoteKey {
        self.key
    }

    /// Frame the voice started on.
    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn is_sample(&self) -> bool {
        matches!(self.source, VoiceSource::Sample(_))
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Current oscillator frequency; `None` for sample voices.
    pub fn frequency(&self) -> Option<f32> {
        match &self.source {
            VoiceSource::Synth(graph) => Some(graph.signal.frequency()),
            VoiceSource::Sample(_) => None,
        }
    }

    /// Current per-voice gain. Samples play at unity.
    pub fn gain(&self) -> f32 {
        match &self.source {
            VoiceSource::Synth(graph) => graph.get_envelope_level().unwrap_or(0.0),
            VoiceSource::Sample(_) => 1.0,
        }
    }

    pub fn stage(&self) -> VoiceStage {
        if self.released {
            return VoiceStage::Releasing;
        }
        match &self.source {
            VoiceSource::Synth(graph) => match graph.modulator.state() {
                EnvelopeState::Attack | EnvelopeState::Decay => VoiceStage::Attacking,
                EnvelopeState::Sustain => VoiceStage::Sustained,
                EnvelopeState::Release | EnvelopeState::Idle => VoiceStage::Releasing,
            },
            VoiceSource::Sample(_) => VoiceStage::Sustained,
        }
    }

    /// Start the release using `release_time` seconds.
    pub(crate) fn release(&mut self, release_time: f32) {
        if self.released {
            return;
        }
        self.released = true;

        if let VoiceSource::Synth(graph) = &mut self.source {
            graph.modulator.set_release(release_time);
            graph.note_off(&self.ctx);
        }
    }

    /// Re-key the voice and glide its oscillator to `hz` over `frames`.
    pub(crate) fn retune(&mut self, key: NoteKey, hz: f32, frames: u32) {
        self.key = key;
        if let VoiceSource::Synth(graph) = &mut self.source {
            graph.signal.glide_to(hz, frames);
        }
    }

    pub(crate) fn render(&mut self, out: &mut [f32]) {
        match &mut self.source {
            VoiceSource::Synth(graph) => graph.render_block(out, &self.ctx),
            VoiceSource::Sample(node) => node.render_block(out, &self.ctx),
        }
    }
}
