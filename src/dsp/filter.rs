use std::f32::consts::TAU;

/*
State Variable Low-Pass
=======================

Topology-preserving (trapezoidal) SVF. Two integrators in a loop, one
sample of state each, stable under per-block cutoff changes:

    g  = tan(π · fc / sr)
    k  = 2 - 2·resonance          (damping)
    h  = 1 / (1 + g·(g + k))

    v3 = x - ic2
    v1 = h·(ic1 + g·v3)           bandpass
    v2 = ic2 + g·v1               lowpass

Only the low-pass tap is used here. With resonance = 1 - √2/2 the damping is
k = √2, which is the Butterworth (maximally flat) response.

The cutoff is clamped below Nyquist: tan() diverges at fc = sr/2.
*/

/// Resonance giving a Butterworth response (k = √2).
pub const BUTTERWORTH_RESONANCE: f32 = 1.0 - std::f32::consts::FRAC_1_SQRT_2;

/// Highest usable cutoff as a fraction of the sample rate.
const MAX_CUTOFF_RATIO: f32 = 0.49;

pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    pub cutoff_hz: f32,
    pub resonance: f32,
}

impl SVFilter {
    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            resonance: BUTTERWORTH_RESONANCE,
        }
    }

    #[inline]
    fn compute_g(&self, sample_rate: f32) -> f32 {
        let cutoff = self.cutoff_hz.clamp(1.0, sample_rate * MAX_CUTOFF_RATIO);
        let wd = TAU * cutoff;
        let wa = (2.0 * sample_rate) * (wd / (2.0 * sample_rate)).tan();
        wa / (2.0 * sample_rate)
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> f32 {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        v2
    }

    /// Filter `input` into `output`.
    pub fn process(&mut self, input: &[f32], output: &mut [f32], sample_rate: f32) {
        debug_assert_eq!(input.len(), output.len());

        let g = self.compute_g(sample_rate);
        let k = 2.0 - (2.0 * self.resonance);

        for (o, &x) in output.iter_mut().zip(input) {
            *o = self.next_sample(x, k, g);
        }
    }

    /// Filter the buffer in place.
    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        let g = self.compute_g(sample_rate);
        let k = 2.0 - (2.0 * self.resonance);

        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, k, g);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff_hz = cutoff;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::OscillatorBlock;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len().min(256);
        buffer
            .get(skip..)
            .unwrap_or(buffer)
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    fn filtered_sine_peak(cutoff: f32, freq: f32) -> f32 {
        let mut filter = SVFilter::lowpass(cutoff);
        let mut osc = OscillatorBlock::sine();
        let mut buffer = vec![0.0f32; 2048];
        osc.render(&mut buffer, freq, SAMPLE_RATE);
        filter.render(&mut buffer, SAMPLE_RATE);
        peak_after_transient(&buffer)
    }

    #[test]
    fn passes_dc() {
        let mut filter = SVFilter::lowpass(500.0);
        let mut buffer = vec![1.0; 1024];

        filter.render(&mut buffer, SAMPLE_RATE);

        assert!(buffer[1023] > 0.99);
    }

    #[test]
    fn attenuates_above_cutoff() {
        let peak = filtered_sine_peak(500.0, 5_000.0);
        assert!(peak < 0.05, "expected high freq attenuation, got peak: {peak}");
    }

    #[test]
    fn butterworth_is_flat_in_passband() {
        let peak = filtered_sine_peak(20_000.0, 440.0);
        assert!((peak - 1.0).abs() < 0.02, "passband peak {peak}");

        // No resonant bump at the cutoff.
        let at_cutoff = filtered_sine_peak(1_000.0, 1_000.0);
        assert!(at_cutoff < 0.75, "cutoff peak {at_cutoff}");
    }

    #[test]
    fn cutoff_above_nyquist_stays_stable() {
        let mut filter = SVFilter::lowpass(40_000.0);
        let mut buffer = vec![0.5; 512];
        filter.render(&mut buffer, 22_050.0);
        assert!(buffer.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn process_matches_in_place_render() {
        let mut osc = OscillatorBlock::sine();
        let mut input = vec![0.0f32; 256];
        osc.render(&mut input, 3_000.0, SAMPLE_RATE);

        let mut a = SVFilter::lowpass(800.0);
        let mut b = SVFilter::lowpass(800.0);

        let mut out = vec![0.0f32; 256];
        a.process(&input, &mut out, SAMPLE_RATE);
        b.render(&mut input, SAMPLE_RATE);

        assert_eq!(out, input);
    }
}
