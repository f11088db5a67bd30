use std::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Normalised filter position → cutoff: 200 Hz at 0, 20 kHz at 1.
pub fn filter_cutoff_hz(normalized: f32) -> f32 {
    200.0 * 100.0_f32.powf(normalized.clamp(0.0, 1.0))
}

/// Distortion amount → waveshaper curve constant.
pub fn distortion_k(amount: f32) -> f32 {
    amount.clamp(0.0, 1.0) * 400.0
}

/// Process-wide effect settings. Shared by every voice, last write wins.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EffectsParameters {
    /// Master output gain, 0..=1.
    pub master_volume: f32,
    /// Gain of the reverb branch, 0..=1.
    pub reverb_mix: f32,
    /// Delay branch time in seconds.
    pub delay_time: f32,
    /// Distortion amount, 0..=1 (k = amount · 400).
    pub distortion: f32,
    /// Filter position, 0..=1 (exponential 200 Hz … 20 kHz).
    pub filter_cutoff: f32,
    /// Envelope attack in seconds.
    pub attack: f32,
    /// Envelope release in seconds.
    pub release: f32,
}

impl Default for EffectsParameters {
    fn default() -> Self {
        Self {
            master_volume: 0.5,
            reverb_mix: 0.0,
            delay_time: 0.0,
            distortion: 0.0,
            filter_cutoff: 1.0,
            attack: 0.01,
            release: 0.1,
        }
    }
}

impl EffectsParameters {
    pub const UNIT_RANGE: RangeInclusive<f32> = 0.0..=1.0;
    pub const ATTACK_RANGE: RangeInclusive<f32> = 0.0..=2.0;
    pub const RELEASE_RANGE: RangeInclusive<f32> = 0.0..=5.0;

    pub fn filter_hz(&self) -> f32 {
        filter_cutoff_hz(self.filter_cutoff)
    }

    pub fn distortion_k(&self) -> f32 {
        distortion_k(self.distortion)
    }

    /// Every field forced into its interval. NaN fields fall back to the
    /// default value.
    pub fn clamped(self, max_delay_time: f32) -> Self {
        let defaults = Self::default();
        let fix = |name, value: f32, fallback: f32, range: RangeInclusive<f32>| {
            clamp_param(name, value, range).unwrap_or(fallback)
        };

        Self {
            master_volume: fix("master_volume", self.master_volume, defaults.master_volume, Self::UNIT_RANGE),
            reverb_mix: fix("reverb_mix", self.reverb_mix, defaults.reverb_mix, Self::UNIT_RANGE),
            delay_time: fix("delay_time", self.delay_time, defaults.delay_time, 0.0..=max_delay_time.max(0.0)),
            distortion: fix("distortion", self.distortion, defaults.distortion, Self::UNIT_RANGE),
            filter_cutoff: fix("filter_cutoff", self.filter_cutoff, defaults.filter_cutoff, Self::UNIT_RANGE),
            attack: fix("attack", self.attack, defaults.attack, Self::ATTACK_RANGE),
            release: fix("release", self.release, defaults.release, Self::RELEASE_RANGE),
        }
    }
}

/// Clamp `value` into `range`. NaN has no meaningful clamp and is rejected.
pub fn clamp_param(name: &str, value: f32, range: RangeInclusive<f32>) -> Option<f32> {
    if value.is_nan() {
        warn!(param = name, "Rejected NaN parameter value");
        return None;
    }
    Some(value.clamp(*range.start(), *range.end()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_mapping_spans_200_to_20k() {
        assert!((filter_cutoff_hz(0.0) - 200.0).abs() < 1e-3);
        assert!((filter_cutoff_hz(0.5) - 2_000.0).abs() < 0.5);
        assert!((filter_cutoff_hz(1.0) - 20_000.0).abs() < 1.0);
        assert!((filter_cutoff_hz(7.0) - 20_000.0).abs() < 1.0);
    }

    #[test]
    fn distortion_mapping() {
        assert_eq!(distortion_k(0.0), 0.0);
        assert_eq!(distortion_k(0.5), 200.0);
        assert_eq!(distortion_k(2.0), 400.0);
    }

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(clamp_param("x", 1.5, 0.0..=1.0), Some(1.0));
        assert_eq!(clamp_param("x", -0.5, 0.0..=1.0), Some(0.0));
        assert_eq!(clamp_param("x", f32::INFINITY, 0.0..=5.0), Some(5.0));
        assert_eq!(clamp_param("x", f32::NAN, 0.0..=1.0), None);
    }

    #[test]
    fn clamped_repairs_every_field() {
        let params = EffectsParameters {
            master_volume: 3.0,
            reverb_mix: f32::NAN,
            delay_time: 9.0,
            distortion: -1.0,
            filter_cutoff: 0.25,
            attack: 10.0,
            release: -2.0,
        }
        .clamped(5.0);

        assert_eq!(params.master_volume, 1.0);
        assert_eq!(params.reverb_mix, 0.0);
        assert_eq!(params.delay_time, 5.0);
        assert_eq!(params.distortion, 0.0);
        assert_eq!(params.filter_cutoff, 0.25);
        assert_eq!(params.attack, 2.0);
        assert_eq!(params.release, 0.0);
    }
}
