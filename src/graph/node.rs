/// Context passed to graph nodes during rendering
///
/// Contains information about what to render:
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - frequency: Pitch the voice was started at (Hz)
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
}

impl RenderCtx {
    /// Create context from a direct frequency
    pub fn from_freq(sample_rate: f32, frequency: f32) -> Self {
        Self {
            sample_rate,
            frequency,
        }
    }

    /// Whole frames spanned by `seconds` at this sample rate.
    pub fn frames(&self, seconds: f32) -> u32 {
        (seconds.max(0.0) * self.sample_rate).round() as u32
    }
}

/// Core trait for audio processing graph nodes
///
/// Nodes can render audio and respond to note events
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Triggered when a key starts the voice
    fn note_on(&mut self, _ctx: &RenderCtx) {}

    /// Triggered when the key is released
    fn note_off(&mut self, _ctx: &RenderCtx) {}

    /// Level of the gain envelope, for nodes that carry one
    fn get_envelope_level(&self) -> Option<f32> {
        None
    }

    /// False once the node has finished sounding
    fn is_active(&self) -> bool {
        true
    }
}
