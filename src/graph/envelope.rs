use crate::{
    dsp::envelope::{Envelope, EnvelopeShape, EnvelopeState},
    graph::node::{GraphNode, RenderCtx},
};

/// Graph node rendering a note envelope as a gain signal.
pub struct EnvNode {
    env: Envelope,
}

impl EnvNode {
    pub fn new(shape: EnvelopeShape, attack: f32, release: f32) -> Self {
        Self {
            env: Envelope::new(shape, attack, release),
        }
    }

    /// Release time used by the next `note_off`.
    pub fn set_release(&mut self, release: f32) {
        self.env.set_release(release);
    }

    pub fn state(&self) -> EnvelopeState {
        self.env.state()
    }

    pub fn level(&self) -> f32 {
        self.env.level()
    }
}

impl GraphNode for EnvNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.env.render(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.env.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.env.note_off(ctx);
    }

    fn get_envelope_level(&self) -> Option<f32> {
        Some(self.env.level())
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}
