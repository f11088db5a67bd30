use crate::{
    config::Topology,
    dsp::{
        delay::DelayLine,
        distortion::WaveShaper,
        filter::SVFilter,
        mix::{add_scaled, apply_gain, sum_in_place},
        reverb::Convolver,
    },
    engine::params::EffectsParameters,
    MAX_BLOCK_SIZE,
};

/*
Effects Graph
=============

One fixed routing, built once, never rewired. Every synthesized voice is
summed onto a single voice bus which fans out to parallel branches:

                      ┌──→ [ low-pass ] ─────────────────┐
                      │                                   │    (Full only)
                      ├──→ [ waveshaper ] ───────────────┤
  voice bus ──────────┤                                   ├──→ (+) ──→ [ master ] ──→ L/R
                      ├──→ [ convolver ] ──→ [ reverb ] ─┤
                      │                        gain       │
                      └──→ [ delay ] ────────────────────┘
                                                          │
  sample bus ─────────────────────────────────────────────┘

The branches are parallel, not a chain: the filter never feeds the reverb.
Each branch carries the full dry signal, so the Full topology is louder
than Minimal for the same master volume.

Minimal drops the filter and waveshaper branches. With reverb gain 0 and
delay 0 it reduces to `voice × master`.

Sample voices skip the branches and join at the master stage.

Reverb
------
Until an impulse response arrives the reverb branch outputs silence. While
its gain is exactly 0 the convolution is skipped; the history is cleared
once so a later fade-in starts clean.
*/

pub struct EffectsGraph {
    topology: Topology,
    sample_rate: f32,

    filter: SVFilter,
    shaper: WaveShaper,
    convolver: Option<Box<Convolver>>,
    reverb_gain: f32,
    reverb_cleared: bool,
    delay: DelayLine,
    master_volume: f32,

    branch: Vec<f32>,
    wet_left: Vec<f32>,
    wet_right: Vec<f32>,
}

impl EffectsGraph {
    pub fn new(
        topology: Topology,
        sample_rate: f32,
        max_delay_time: f32,
        params: &EffectsParameters,
    ) -> Self {
        let mut graph = Self {
            topology,
            sample_rate,
            filter: SVFilter::lowpass(params.filter_hz()),
            shaper: WaveShaper::new(params.distortion_k()),
            convolver: None,
            reverb_gain: 0.0,
            reverb_cleared: true,
            delay: DelayLine::new(max_delay_time, sample_rate),
            master_volume: 0.0,
            branch: vec![0.0; MAX_BLOCK_SIZE],
            wet_left: vec![0.0; MAX_BLOCK_SIZE],
            wet_right: vec![0.0; MAX_BLOCK_SIZE],
        };
        graph.apply(params);
        graph
    }

    /// Push every parameter into its stage.
    pub fn apply(&mut self, params: &EffectsParameters) {
        self.set_master_volume(params.master_volume);
        self.set_reverb_gain(params.reverb_mix);
        self.set_delay_time(params.delay_time);
        self.set_distortion_k(params.distortion_k());
        self.set_filter_hz(params.filter_hz());
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume;
    }

    pub fn set_reverb_gain(&mut self, gain: f32) {
        self.reverb_gain = gain;
    }

    pub fn set_delay_time(&mut self, seconds: f32) {
        self.delay.set_delay_seconds(seconds, self.sample_rate);
    }

    pub fn set_distortion_k(&mut self, k: f32) {
        self.shaper.set_amount(k);
    }

    pub fn set_filter_hz(&mut self, hz: f32) {
        self.filter.set_cutoff(hz);
    }

    /// Install the reverb kernel, replacing any previous one.
    pub fn set_convolver(&mut self, convolver: Box<Convolver>) {
        self.convolver = Some(convolver);
        self.reverb_cleared = true;
    }

    /// Drop the reverb kernel; the branch goes silent.
    pub fn clear_convolver(&mut self) {
        self.convolver = None;
    }

    pub fn has_reverb(&self) -> bool {
        self.convolver.is_some()
    }

    pub fn delay_samples(&self) -> usize {
        self.delay.delay()
    }

    /// Run one block through the graph into a stereo pair.
    pub fn process(
        &mut self,
        voice_bus: &[f32],
        sample_bus: &[f32],
        left: &mut [f32],
        right: &mut [f32],
    ) {
        let frames = voice_bus.len();
        debug_assert!(frames <= MAX_BLOCK_SIZE);
        debug_assert_eq!(frames, sample_bus.len());
        debug_assert_eq!(frames, left.len());
        debug_assert_eq!(frames, right.len());

        left.fill(0.0);
        right.fill(0.0);
        let branch = &mut self.branch[..frames];

        if self.topology == Topology::Full {
            self.filter.process(voice_bus, branch, self.sample_rate);
            sum_in_place(left, branch);
            sum_in_place(right, branch);

            self.shaper.process(voice_bus, branch);
            sum_in_place(left, branch);
            sum_in_place(right, branch);
        }

        if let Some(convolver) = self.convolver.as_mut() {
            if self.reverb_gain > 0.0 {
                let wet_left = &mut self.wet_left[..frames];
                let wet_right = &mut self.wet_right[..frames];
                convolver.process(voice_bus, wet_left, wet_right);
                add_scaled(left, wet_left, self.reverb_gain);
                add_scaled(right, wet_right, self.reverb_gain);
                self.reverb_cleared = false;
            } else if !self.reverb_cleared {
                convolver.reset();
                self.reverb_cleared = true;
            }
        }

        self.delay.process(voice_bus, branch);
        sum_in_place(left, branch);
        sum_in_place(right, branch);

        sum_in_place(left, sample_bus);
        sum_in_place(right, sample_bus);

        apply_gain(left, self.master_volume);
        apply_gain(right, self.master_volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::reverb::ImpulseResponse;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn ramp(frames: usize) -> Vec<f32> {
        (0..frames).map(|i| (i as f32 / frames as f32) - 0.5).collect()
    }

    fn run(graph: &mut EffectsGraph, voice: &[f32], sample: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0; voice.len()];
        let mut right = vec![0.0; voice.len()];
        graph.process(voice, sample, &mut left, &mut right);
        (left, right)
    }

    #[test]
    fn minimal_dry_path_is_master_times_voice() {
        let params = EffectsParameters::default();
        let mut graph = EffectsGraph::new(Topology::Minimal, SAMPLE_RATE, 5.0, &params);

        let voice = ramp(256);
        let (left, right) = run(&mut graph, &voice, &[0.0; 256]);

        for (i, &v) in voice.iter().enumerate() {
            assert!((left[i] - v * 0.5).abs() < 1e-6);
            assert_eq!(left[i], right[i]);
        }
    }

    #[test]
    fn full_topology_sums_parallel_branches() {
        let params = EffectsParameters {
            master_volume: 1.0,
            ..EffectsParameters::default()
        };
        let mut graph = EffectsGraph::new(Topology::Full, SAMPLE_RATE, 5.0, &params);

        // DC settles through the filter; waveshaper at k = 0 is x/3.
        let voice = vec![0.3f32; 2048];
        let (left, _) = run(&mut graph, &voice, &vec![0.0; 2048]);
        let expected = 0.3 + 0.1 + 0.3;
        assert!((left[2047] - expected).abs() < 1e-3, "got {}", left[2047]);
    }

    #[test]
    fn delay_branch_shifts_signal() {
        let params = EffectsParameters {
            master_volume: 1.0,
            delay_time: 0.001,
            ..EffectsParameters::default()
        };
        let mut graph = EffectsGraph::new(Topology::Minimal, SAMPLE_RATE, 5.0, &params);
        assert_eq!(graph.delay_samples(), 48);

        let mut voice = vec![0.0f32; 128];
        voice[0] = 1.0;
        let (left, _) = run(&mut graph, &voice, &[0.0; 128]);
        assert_eq!(left[48], 1.0);
        assert_eq!(left[0], 0.0);
    }

    #[test]
    fn samples_join_at_master() {
        let mut graph = EffectsGraph::new(Topology::Full, SAMPLE_RATE, 5.0, &EffectsParameters::default());
        let (left, right) = run(&mut graph, &[0.0; 64], &[0.8; 64]);
        assert!(left.iter().chain(right.iter()).all(|&s| (s - 0.4).abs() < 1e-6));
    }

    #[test]
    fn reverb_without_impulse_is_silent_bypass() {
        let params = EffectsParameters {
            reverb_mix: 1.0,
            ..EffectsParameters::default()
        };
        let mut graph = EffectsGraph::new(Topology::Minimal, SAMPLE_RATE, 5.0, &params);
        assert!(!graph.has_reverb());

        let voice = ramp(128);
        let (left, _) = run(&mut graph, &voice, &[0.0; 128]);
        for (i, &v) in voice.iter().enumerate() {
            assert!((left[i] - v * 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn reverb_adds_stereo_tail() {
        let params = EffectsParameters {
            reverb_mix: 1.0,
            master_volume: 1.0,
            ..EffectsParameters::default()
        };
        let mut graph = EffectsGraph::new(Topology::Minimal, SAMPLE_RATE, 5.0, &params);
        let ir = ImpulseResponse::from_channels(vec![0.0, 0.0, 1.0], vec![0.0, 0.0, 0.0, -1.0], SAMPLE_RATE);
        graph.set_convolver(Box::new(Convolver::with_block_size(&ir, 16)));

        let mut voice = vec![0.0f32; 64];
        voice[0] = 1.0;
        let (left, right) = run(&mut graph, &voice, &[0.0; 64]);

        // dry impulse from the delay branch, then the wet taps after one block
        assert_eq!(left[0], 1.0);
        assert!((left[16 + 2] - 1.0).abs() < 1e-5);
        assert!((right[16 + 3] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn muted_reverb_forgets_history() {
        let params = EffectsParameters {
            reverb_mix: 1.0,
            master_volume: 1.0,
            ..EffectsParameters::default()
        };
        let mut graph = EffectsGraph::new(Topology::Minimal, SAMPLE_RATE, 5.0, &params);
        let ir = ImpulseResponse::from_channels(vec![1.0; 200], vec![1.0; 200], SAMPLE_RATE);
        graph.set_convolver(Box::new(Convolver::with_block_size(&ir, 16)));

        run(&mut graph, &[1.0; 64], &[0.0; 64]);
        graph.set_reverb_gain(0.0);
        run(&mut graph, &[0.0; 64], &[0.0; 64]);
        graph.set_reverb_gain(1.0);

        let (left, _) = run(&mut graph, &[0.0; 64], &[0.0; 64]);
        assert!(left.iter().all(|s| s.abs() < 1e-6));
    }
}
