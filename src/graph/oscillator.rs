use crate::dsp::{
    oscillator::{OscillatorBlock, Waveform},
    ramp::LinearRamp,
};
use crate::graph::node::{GraphNode, RenderCtx};

/*
Audio Oscillator
================

The tone source of a synthesized key. The waveform is fixed for the life of
the voice; the frequency is not.

Waveform Types and Their Character:
-----------------------------------

Sine: The purest tone - a single frequency with no harmonics.
  - Sound: Smooth, hollow, flute-like
  - Harmonics: Fundamental only (no overtones)

Sawtooth: The richest waveform - contains all harmonics.
  - Sound: Bright, buzzy, brassy
  - Harmonics: All harmonics, amplitude falls off as 1/n

Square: Hollow but powerful - only odd harmonics.
  - Sound: Hollow, woody, clarinet-like
  - Harmonics: Odd harmonics only, amplitude falls off as 1/n

Triangle: Mellow and soft - weak odd harmonics.
  - Sound: Soft, between sine and square
  - Harmonics: Odd harmonics only, but fall off as 1/n²

Glide
-----
Dragging a held pointer across the keyboard retunes the sounding voice
instead of restarting it. The frequency is a ramp: `glide_to` moves it
linearly from wherever it currently is to the new pitch, one step per
sample.

  Hz
  293.66 ┤          ╭──────
         │        ╱
  261.63 ┼───────╯
         └───────┬──┬──────→ Time
               drag  +0.1s

Example usage:
  let osc = OscNode::new(Waveform::Sawtooth);
  let voice = osc.amplify(EnvNode::new(shape, attack, release));
*/

pub struct OscNode {
    osc: OscillatorBlock,
    frequency: LinearRamp,
}

impl OscNode {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            frequency: LinearRamp::new(0.0),
        }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine)
    }

    pub fn waveform(&self) -> Waveform {
        self.osc.waveform()
    }

    /// Frequency the oscillator is currently producing.
    pub fn frequency(&self) -> f32 {
        self.frequency.value()
    }

    /// Frequency the oscillator is heading towards.
    pub fn target_frequency(&self) -> f32 {
        self.frequency.target()
    }

    /// Jump to `hz` immediately.
    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency.set(hz);
    }

    /// Slide linearly to `hz` over `frames` samples.
    pub fn glide_to(&mut self, hz: f32, frames: u32) {
        self.frequency.ramp_to(hz, frames);
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        if !self.frequency.is_ramping() {
            self.osc
                .render(out, self.frequency.value(), ctx.sample_rate);
            return;
        }

        for sample in out.iter_mut() {
            let hz = self.frequency.next();
            *sample = self.osc.next_sample(hz, ctx.sample_rate);
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.osc.reset();
        self.frequency.set(ctx.frequency);
    }
}
