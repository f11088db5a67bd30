/// Linear transition of a control value over a whole number of frames.
///
/// Used for oscillator glides: `ramp_to` starts from the current value, so
/// a second ramp issued mid-transition continues from wherever the first one
/// got to.
#[derive(Debug, Clone, Copy)]
pub struct LinearRamp {
    current: f32,
    target: f32,
    step: f32,
    remaining: u32,
}

impl LinearRamp {
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            remaining: 0,
        }
    }

    /// Jump to `value` immediately, cancelling any transition.
    pub fn set(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.remaining = 0;
    }

    /// Reach `target` after `frames` calls to `next`. Zero frames jumps.
    pub fn ramp_to(&mut self, target: f32, frames: u32) {
        if frames == 0 {
            self.set(target);
            return;
        }
        self.target = target;
        self.step = (target - self.current) / frames as f32;
        self.remaining = frames;
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }
        self.current
    }

    pub fn value(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_ramping(&self) -> bool {
        self.remaining > 0
    }
}
