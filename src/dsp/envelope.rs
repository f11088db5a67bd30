use crate::{graph::node::RenderCtx, MIN_TIME};

/*
Note Envelope
=============

A linear attack/decay/sustain/release generator shaping the gain of one
voice. Unlike a textbook ADSR the attack does not rise to 1.0: it peaks at
`peak_level` and decays to a lower `sustain_level`, which keeps a piano
chord from clipping the master bus.

The Shape
---------

  Level
   peak ┐     ╱╲
        │    ╱  ╲___________
   sus  │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release

Release always starts from the CURRENT level, not the sustain level, so a
note released mid-attack ramps down from wherever it got to.


Release Length
--------------

Release is pre-computed in whole frames at note_off time via
`release_frames`. The voice manager uses the same function to schedule
teardown, so the frame that removes a voice is exactly the frame the
envelope reaches zero. A release time of zero (or less) still takes one
frame, never zero frames.
*/

/// Number of frames a release of `release_time` seconds lasts.
pub fn release_frames(release_time: f32, sample_rate: f32) -> u64 {
    if !(release_time > MIN_TIME) {
        return 1;
    }
    (release_time * sample_rate).round().max(1.0) as u64
}

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,    // Gate low, envelope inactive, level = 0
    Attack,  // Ramping from 0 to peak
    Decay,   // Ramping from peak down to sustain
    Sustain, // Holding at sustain level while gate is high
    Release, // Gate went low, ramping down to 0
}

/// Fixed parts of the envelope shape; attack and release come from the
/// live effect parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnvelopeShape {
    pub peak_level: f32,
    pub sustain_level: f32,
    pub decay_time: f32,
}

impl Default for EnvelopeShape {
    fn default() -> Self {
        Self {
            peak_level: 0.7,
            sustain_level: 0.5,
            decay_time: 0.1,
        }
    }
}

pub struct Envelope {
    attack_time: f32,
    decay_time: f32,
    peak_level: f32,
    sustain_level: f32,
    release_time: f32,

    stage: EnvelopeState,
    level: f32,

    release_start_level: f32,
    release_total_samples: u64,
    release_elapsed_samples: u64,
}

impl Envelope {
    pub fn new(shape: EnvelopeShape, attack: f32, release: f32) -> Self {
        let peak_level = shape.peak_level.clamp(0.0, 1.0);
        Self {
            attack_time: attack.max(MIN_TIME),
            decay_time: shape.decay_time.max(MIN_TIME),
            peak_level,
            sustain_level: shape.sustain_level.clamp(0.0, peak_level),
            release_time: release,

            stage: EnvelopeState::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    /// Gate high: start the attack phase from zero.
    pub fn note_on(&mut self, _ctx: &RenderCtx) {
        self.level = 0.0;
        self.stage = EnvelopeState::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Gate low: start the release phase from the current level.
    pub fn note_off(&mut self, ctx: &RenderCtx) {
        if matches!(self.stage, EnvelopeState::Idle | EnvelopeState::Release) {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = release_frames(self.release_time, ctx.sample_rate);
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeState::Release;
    }

    /// Release time used by the next `note_off`.
    pub fn set_release(&mut self, release: f32) {
        self.release_time = release;
    }

    /// Advance the envelope by one sample.
    pub fn next_sample(&mut self, ctx: &RenderCtx) {
        match self.stage {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attack => {
                let increment = self.peak_level / (self.attack_time * ctx.sample_rate);
                self.level += increment;

                if self.level >= self.peak_level {
                    self.level = self.peak_level;
                    self.stage = EnvelopeState::Decay;
                }
            }

            EnvelopeState::Decay => {
                let target = self.sustain_level;
                let total_drop = self.peak_level - target;
                let decrement = total_drop / (self.decay_time * ctx.sample_rate);
                self.level -= decrement;

                if self.level <= target {
                    self.level = target;
                    self.stage = EnvelopeState::Sustain;
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.sustain_level;
            }

            EnvelopeState::Release => {
                // level = start * (1 - elapsed/total)
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeState::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        for sample in buffer.iter_mut() {
            self.next_sample(ctx);
            *sample = self.level;
        }
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeState::Idle)
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
        self.release_elapsed_samples = 0;
        self.release_start_level = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::RenderCtx;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn ctx() -> RenderCtx {
        RenderCtx::from_freq(SAMPLE_RATE, 440.0)
    }

    fn render_samples(env: &mut Envelope, samples: usize) {
        let ctx = ctx();
        for _ in 0..samples {
            env.next_sample(&ctx);
        }
    }

    #[test]
    fn attack_reaches_peak_level() {
        let mut env = Envelope::new(EnvelopeShape::default(), 0.01, 0.2);

        env.note_on(&ctx());
        render_samples(&mut env, (0.01 * SAMPLE_RATE) as usize);

        assert!((env.level() - 0.7).abs() < 1e-3, "expected attack to reach 0.7");
        assert!(!matches!(env.state(), EnvelopeState::Attack));
    }

    #[test]
    fn decays_to_sustain_plateau() {
        let mut env = Envelope::new(EnvelopeShape::default(), 0.01, 0.2);

        env.note_on(&ctx());
        render_samples(&mut env, ((0.01 + 0.1) * SAMPLE_RATE) as usize + 5);

        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((env.level() - 0.5).abs() < 1e-6, "sustain level should be held");
    }

    #[test]
    fn release_falls_back_to_idle_in_exact_frames() {
        let release = 0.03;
        let mut env = Envelope::new(EnvelopeShape::default(), 0.01, release);

        env.note_on(&ctx());
        render_samples(&mut env, 20);

        env.note_off(&ctx());
        let frames = release_frames(release, SAMPLE_RATE);
        render_samples(&mut env, frames as usize - 1);
        assert_eq!(env.state(), EnvelopeState::Release);

        render_samples(&mut env, 1);
        assert_eq!(env.level(), 0.0);
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn release_during_attack_starts_from_current_level() {
        let mut env = Envelope::new(EnvelopeShape::default(), 0.1, 0.05);
        env.note_on(&ctx());
        render_samples(&mut env, 10);
        let before = env.level();
        assert!(before < 0.7);

        env.note_off(&ctx());
        render_samples(&mut env, 1);
        assert!(env.level() <= before + 1e-6);
    }

    #[test]
    fn zero_release_takes_one_frame() {
        assert_eq!(release_frames(0.0, SAMPLE_RATE), 1);
        assert_eq!(release_frames(-1.0, SAMPLE_RATE), 1);
        assert_eq!(release_frames(f32::NAN, SAMPLE_RATE), 1);

        let mut env = Envelope::new(EnvelopeShape::default(), 0.01, 0.0);
        env.note_on(&ctx());
        render_samples(&mut env, 50);
        env.note_off(&ctx());
        render_samples(&mut env, 1);
        assert!(!env.is_active());
    }

    #[test]
    fn second_note_off_does_not_restart_release() {
        let mut env = Envelope::new(EnvelopeShape::default(), 0.01, 0.1);
        env.note_on(&ctx());
        render_samples(&mut env, 200);
        env.note_off(&ctx());
        render_samples(&mut env, 50);
        let mid = env.level();

        env.note_off(&ctx());
        render_samples(&mut env, 1);
        assert!(env.level() <= mid);
    }
}
