use crate::{
    dsp::{envelope::EnvelopeShape, oscillator::Waveform},
    graph::{
        envelope::EnvNode, extensions::NodeExt, node::GraphNode, oscillator::OscNode, SynthVoice,
    },
};

/// Factory for creating voices with a specific patch/sound design
///
/// This is the "instrument design" layer - the voice manager asks it for a
/// fresh graph every time a synthesized key starts.
pub trait VoiceFactory: Send {
    type Voice: GraphNode;

    fn create_voice(&self) -> Self::Voice;
}

/// The oscillator + envelope patch every synthesized key is built from.
///
/// Attack and release are copied in from the live effect parameters; the
/// envelope shape and waveform are changed through the voice manager.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthPatch {
    pub waveform: Waveform,
    pub shape: EnvelopeShape,
    pub attack: f32,
    pub release: f32,
}

impl Default for SynthPatch {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            shape: EnvelopeShape::default(),
            attack: 0.01,
            release: 0.1,
        }
    }
}

impl VoiceFactory for SynthPatch {
    type Voice = SynthVoice;

    fn create_voice(&self) -> Self::Voice {
        OscNode::new(self.waveform).amplify(EnvNode::new(self.shape, self.attack, self.release))
    }
}
