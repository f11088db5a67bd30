//! Distortion / Waveshaping
//!
//! Distortion adds harmonics by reshaping the waveform. A waveshaper maps
//! every input sample through a transfer curve stored as a lookup table:
//!
//!   output = curve(input)
//!
//! # The Curve
//!
//! The table is filled from a single "amount" constant `k`:
//!
//!   x        = i · 2 / n - 1                (spans [-1, 1) across the table)
//!   curve[i] = (3 + k) · x · 20° / (π + k · |x|)
//!
//! where 20° is 20·π/180 radians.
//!
//! At k = 0 the formula collapses to x / 3: a straight line, quiet but clean.
//! As k grows the denominator bends the line into a soft knee and the curve
//! approaches a hard clip:
//!
//!   k = 0      linear, slope 1/3
//!   k = 40     warm saturation
//!   k = 400    heavy, almost square
//!
//! # Lookup
//!
//! Input in [-1, 1] is mapped onto the table index range [0, n-1]:
//!
//!   v = (x + 1) / 2 · (n - 1)
//!
//! and linearly interpolated between neighbours. Inputs beyond ±1 hold the
//! edge values.

use std::f32::consts::PI;

/// Number of points in the transfer curve.
pub const CURVE_LENGTH: usize = 44_100;

const TWENTY_DEGREES: f32 = 20.0 * PI / 180.0;

/// Fill `curve` with the transfer function for amount `k` (k ≥ 0).
pub fn fill_distortion_curve(curve: &mut [f32], k: f32) {
    let n = curve.len() as f32;
    for (i, value) in curve.iter_mut().enumerate() {
        let x = i as f32 * 2.0 / n - 1.0;
        *value = (3.0 + k) * x * TWENTY_DEGREES / (PI + k * x.abs());
    }
}

/// Table-lookup waveshaper. The curve is allocated once; changing the amount
/// refills it in place.
pub struct WaveShaper {
    curve: Vec<f32>,
    amount: f32,
}

impl WaveShaper {
    pub fn new(amount: f32) -> Self {
        Self::with_length(amount, CURVE_LENGTH)
    }

    pub fn with_length(amount: f32, length: usize) -> Self {
        let mut shaper = Self {
            curve: vec![0.0; length.max(2)],
            amount: f32::NAN,
        };
        shaper.set_amount(amount);
        shaper
    }

    /// Set the curve constant `k`. Negative values are treated as 0.
    pub fn set_amount(&mut self, k: f32) {
        let k = k.max(0.0);
        if k == self.amount {
            return;
        }
        self.amount = k;
        fill_distortion_curve(&mut self.curve, k);
    }

    pub fn amount(&self) -> f32 {
        self.amount
    }

    pub fn curve(&self) -> &[f32] {
        &self.curve
    }

    #[inline]
    pub fn shape(&self, sample: f32) -> f32 {
        let last = self.curve.len() - 1;
        let v = (sample + 1.0) * 0.5 * last as f32;

        if !(v > 0.0) {
            return self.curve[0];
        }
        if v >= last as f32 {
            return self.curve[last];
        }

        let index = v as usize;
        let frac = v - index as f32;
        let a = self.curve[index];
        let b = self.curve[index + 1];
        a + (b - a) * frac
    }

    /// Shape `input` into `output`.
    pub fn process(&self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        for (o, &x) in output.iter_mut().zip(input) {
            *o = self.shape(x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_amount_is_linear_with_slope_one_third() {
        let shaper = WaveShaper::new(0.0);
        for &x in &[-0.9f32, -0.5, -0.1, 0.0, 0.25, 0.5, 0.9] {
            let y = shaper.shape(x);
            assert!(
                (y - x / 3.0).abs() < 1e-4,
                "shape({x}) = {y}, expected {}",
                x / 3.0
            );
        }
    }

    #[test]
    fn curve_formula_at_known_points() {
        let mut curve = vec![0.0f32; 4];
        fill_distortion_curve(&mut curve, 400.0);

        // i = 0 → x = -1
        let expected = 403.0 * -1.0 * TWENTY_DEGREES / (PI + 400.0);
        assert!((curve[0] - expected).abs() < 1e-6);
        // i = 2 → x = 0
        assert_eq!(curve[2], 0.0);
    }

    #[test]
    fn curve_is_odd_and_monotonic() {
        let shaper = WaveShaper::new(200.0);
        let curve = shaper.curve();
        assert!(curve.windows(2).all(|w| w[1] >= w[0]));

        let a = shaper.shape(0.6);
        let b = shaper.shape(-0.6);
        assert!((a + b).abs() < 1e-3);
    }

    #[test]
    fn inputs_beyond_unit_range_hold_edges() {
        let shaper = WaveShaper::with_length(50.0, 1024);
        let curve = shaper.curve();
        assert_eq!(shaper.shape(-3.0), curve[0]);
        assert_eq!(shaper.shape(3.0), curve[1023]);
        assert_eq!(shaper.shape(f32::NAN), curve[0]);
    }

    #[test]
    fn higher_amount_drives_harder() {
        let soft = WaveShaper::new(10.0);
        let hard = WaveShaper::new(400.0);
        assert!(hard.shape(0.2) > soft.shape(0.2));
    }

    #[test]
    fn negative_amount_clamps_to_zero() {
        let mut shaper = WaveShaper::with_length(5.0, 256);
        shaper.set_amount(-3.0);
        assert_eq!(shaper.amount(), 0.0);
    }
}
