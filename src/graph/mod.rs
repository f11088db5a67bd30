//! Per-voice building blocks.
//!
//! Graph nodes wrap the low-level DSP primitives with what a sounding key
//! needs: note events, block rendering and an activity flag the voice
//! manager can poll. A synthesized key is `OscNode × EnvNode`; a sampled key
//! is a `SampleNode`.

/// Multiply two signals together (amplitude control).
pub mod amplify;
/// Envelope generator node.
pub mod envelope;
/// Fluent combinators (`.amplify()`).
pub mod extensions;
/// Core traits shared by all graph nodes.
pub mod node;
/// Oscillator node with frequency glide.
pub mod oscillator;
/// One-shot sample playback.
pub mod sample;

/// The node graph behind every synthesized key.
pub type SynthVoice = amplify::Amplify<oscillator::OscNode, envelope::EnvNode>;
