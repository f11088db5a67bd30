//! Low-level DSP primitives used by the graph nodes and the effects graph.
//!
//! Processing is allocation-free once constructed, so these can live inside
//! voices and the effects graph on the audio thread. Constructors that need
//! memory (delay buffers, distortion tables, FFT plans) allocate up front.

/// Time-domain delay line.
pub mod delay;
/// Waveshaper and its distortion transfer curve.
pub mod distortion;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// State-variable low-pass filter.
pub mod filter;
/// Buffer summing helpers.
pub mod mix;
/// Phase-accumulator oscillator waveforms.
pub mod oscillator;
/// Linear parameter ramps (glides).
pub mod ramp;
/// Partitioned FFT convolution and impulse responses.
pub mod reverb;

pub use envelope::{EnvelopeShape, EnvelopeState};
pub use oscillator::Waveform;
pub use reverb::{Convolver, ImpulseResponse};
