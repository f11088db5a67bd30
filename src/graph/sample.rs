use std::sync::Arc;

use crate::graph::node::{GraphNode, RenderCtx};
use crate::io::samples::SampleBuffer;

/*
Sample Playback
===============

Plays a decoded note recording once, from the start, at its recorded pitch.
The recording may have a different sample rate than the engine, so the read
head advances by

    step = buffer_rate / engine_rate

frames per output sample and reads between frames with linear
interpolation. Past the last frame the node outputs silence and reports
itself inactive; it does not loop.

A recording carries its own decay, so note_off does nothing here: stopping
a sample voice is the voice manager removing it.
*/

pub struct SampleNode {
    buffer: Arc<SampleBuffer>,
    position: f64,
}

impl SampleNode {
    pub fn new(buffer: Arc<SampleBuffer>) -> Self {
        Self {
            buffer,
            position: 0.0,
        }
    }

    /// Read head in buffer frames.
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.buffer.frames.len() as f64
    }
}

impl GraphNode for SampleNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let frames = &self.buffer.frames;
        let step = self.buffer.sample_rate as f64 / ctx.sample_rate as f64;

        for sample in out.iter_mut() {
            let index = self.position as usize;
            *sample = match (frames.get(index), frames.get(index + 1)) {
                (Some(&a), Some(&b)) => {
                    let frac = (self.position - index as f64) as f32;
                    a + (b - a) * frac
                }
                (Some(&a), None) => a,
                _ => 0.0,
            };
            self.position += step;
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.position = 0.0;
    }

    fn is_active(&self) -> bool {
        !self.is_finished()
    }
}
