//! Reverb - Convolution with an Impulse Response
//!
//! A room is a linear, time-invariant system: everything it does to a sound
//! is captured by its response to a single click, the impulse response (IR).
//! Convolving a dry signal with the IR places it in that room.
//!
//! # Uniformly Partitioned Convolution
//!
//! Direct convolution with a 2 second IR costs ~100k multiplies per sample.
//! Instead the IR is cut into P partitions of B samples, each transformed once
//! with an FFT of size N = 2B:
//!
//! ```text
//! IR:   [ h0 | h1 | h2 | ... | hP-1 ]      each hp zero-padded to N, FFT'd
//!
//! input blocks →  FFT([prev | cur])  →  frequency-domain delay line (FDL)
//!
//!   Y = X[t]·H0 + X[t-1]·H1 + ... + X[t-P+1]·HP-1
//!
//! IFFT(Y), keep the last B samples (overlap-save)
//! ```
//!
//! Cost per block is one forward FFT, P complex multiply-accumulates per bin
//! and one inverse FFT. Latency is one block (B samples).
//!
//! # Stereo
//!
//! The IR has two channels. Both wet channels are real signals, so they share
//! one inverse FFT: IFFT(YL + i·YR) has yL in the real part and yR in the
//! imaginary part.
//!
//! # Synthetic Rooms
//!
//! Without a recorded IR, `ImpulseResponse::synthetic` builds a plausible
//! hall from white noise under a quadratic fade:
//!
//! ```text
//! h[i] = noise · (1 - i/len)²
//! ```

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Partition length used by the engine.
pub const CONVOLUTION_BLOCK: usize = 256;

/// Two-channel impulse response at a known sample rate.
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    pub channels: [Vec<f32>; 2],
    pub sample_rate: f32,
}

impl ImpulseResponse {
    pub fn from_channels(left: Vec<f32>, right: Vec<f32>, sample_rate: f32) -> Self {
        Self {
            channels: [left, right],
            sample_rate,
        }
    }

    /// Decaying stereo noise burst of `seconds` length, normalised.
    pub fn synthetic<R: Rng>(seconds: f32, sample_rate: f32, rng: &mut R) -> Self {
        let length = (seconds.max(0.0) * sample_rate) as usize;
        let channels = [(); 2].map(|_| {
            (0..length)
                .map(|i| {
                    let fade = 1.0 - i as f32 / length as f32;
                    (rng.gen::<f32>() * 2.0 - 1.0) * fade * fade
                })
                .collect()
        });

        let mut ir = Self {
            channels,
            sample_rate,
        };
        ir.normalize();
        ir
    }

    /// Frames per channel (the longer channel wins).
    pub fn len(&self) -> usize {
        self.channels[0].len().max(self.channels[1].len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scale each channel to unit energy. Silent channels are left alone.
    pub fn normalize(&mut self) {
        for channel in &mut self.channels {
            let energy: f32 = channel.iter().map(|s| s * s).sum();
            if energy > f32::EPSILON {
                let scale = energy.sqrt().recip();
                channel.iter_mut().for_each(|s| *s *= scale);
            }
        }
    }

    /// Linearly resample to `sample_rate`.
    pub fn resampled(self, sample_rate: f32) -> Self {
        if (self.sample_rate - sample_rate).abs() < f32::EPSILON || self.sample_rate <= 0.0 {
            return self;
        }
        let ratio = self.sample_rate / sample_rate;
        let channels = self.channels.map(|c| resample_linear(&c, ratio));
        Self {
            channels,
            sample_rate,
        }
    }
}

fn resample_linear(input: &[f32], ratio: f32) -> Vec<f32> {
    if input.is_empty() {
        return Vec::new();
    }
    let length = (input.len() as f32 / ratio).floor() as usize;
    (0..length)
        .map(|n| {
            let pos = n as f32 * ratio;
            let index = pos as usize;
            let frac = pos - index as f32;
            let a = input[index.min(input.len() - 1)];
            let b = input[(index + 1).min(input.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}

/// Streaming stereo convolver (mono in, stereo out).
///
/// Construction allocates and plans the FFTs; `process` does neither.
pub struct Convolver {
    block: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,

    /// Per channel, per partition kernel spectra (N/2 + 1 bins).
    kernels: [Vec<Vec<Complex<f32>>>; 2],
    /// Past input spectra, ring indexed by `fdl_head`.
    fdl: Vec<Vec<Complex<f32>>>,
    fdl_head: usize,

    window: Vec<f32>,
    fill: usize,
    output: [Vec<f32>; 2],

    spectrum: Vec<Complex<f32>>,
    accum: [Vec<Complex<f32>>; 2],
    scratch: Vec<Complex<f32>>,
}

impl fmt::Debug for Convolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Convolver")
            .field("block", &self.block)
            .field("partitions", &self.partitions())
            .finish_non_exhaustive()
    }
}

impl Convolver {
    pub fn new(ir: &ImpulseResponse) -> Self {
        Self::with_block_size(ir, CONVOLUTION_BLOCK)
    }

    pub fn with_block_size(ir: &ImpulseResponse, block: usize) -> Self {
        let block = block.max(1);
        let size = block * 2;
        let bins = block + 1;
        let partitions = ir.len().div_ceil(block).max(1);

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());
        let mut scratch = vec![Complex::default(); scratch_len];

        let mut buffer = vec![Complex::default(); size];
        let kernels = ir.channels.each_ref().map(|channel| {
            (0..partitions)
                .map(|p| {
                    buffer.fill(Complex::default());
                    let start = (p * block).min(channel.len());
                    let end = (start + block).min(channel.len());
                    for (dst, &h) in buffer.iter_mut().zip(&channel[start..end]) {
                        dst.re = h;
                    }
                    fft.process_with_scratch(&mut buffer, &mut scratch);
                    buffer[..bins].to_vec()
                })
                .collect()
        });

        Self {
            block,
            fft,
            ifft,
            kernels,
            fdl: vec![vec![Complex::default(); bins]; partitions],
            fdl_head: 0,
            window: vec![0.0; size],
            fill: 0,
            output: [vec![0.0; block], vec![0.0; block]],
            spectrum: buffer,
            accum: [vec![Complex::default(); bins], vec![Complex::default(); bins]],
            scratch,
        }
    }

    /// Samples between input and the first output sample it affects.
    pub fn latency(&self) -> usize {
        self.block
    }

    pub fn partitions(&self) -> usize {
        self.fdl.len()
    }

    /// Convolve `input` into the two output channels.
    pub fn process(&mut self, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(input.len(), left.len());
        debug_assert_eq!(input.len(), right.len());

        for ((&x, l), r) in input.iter().zip(left.iter_mut()).zip(right.iter_mut()) {
            self.window[self.block + self.fill] = x;
            *l = self.output[0][self.fill];
            *r = self.output[1][self.fill];

            self.fill += 1;
            if self.fill == self.block {
                self.fill = 0;
                self.process_block();
            }
        }
    }

    fn process_block(&mut self) {
        let size = self.block * 2;
        let bins = self.block + 1;
        let partitions = self.fdl.len();

        for (dst, &x) in self.spectrum.iter_mut().zip(&self.window) {
            *dst = Complex::new(x, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        self.fdl_head = (self.fdl_head + 1) % partitions;
        self.fdl[self.fdl_head].copy_from_slice(&self.spectrum[..bins]);

        for (accum, kernel) in self.accum.iter_mut().zip(&self.kernels) {
            accum.fill(Complex::default());
            for (p, h) in kernel.iter().enumerate() {
                let x = &self.fdl[(self.fdl_head + partitions - p) % partitions];
                for ((acc, &xk), &hk) in accum.iter_mut().zip(x).zip(h) {
                    *acc += xk * hk;
                }
            }
        }

        // Pack both real outputs into one inverse transform.
        let i = Complex::new(0.0, 1.0);
        let [yl, yr] = &self.accum;
        for k in 0..size {
            self.spectrum[k] = if k < bins {
                yl[k] + i * yr[k]
            } else {
                yl[size - k].conj() + i * yr[size - k].conj()
            };
        }
        self.ifft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let scale = 1.0 / size as f32;
        let tail = &self.spectrum[self.block..];
        let [out_l, out_r] = &mut self.output;
        for ((l, r), y) in out_l.iter_mut().zip(out_r.iter_mut()).zip(tail) {
            *l = y.re * scale;
            *r = y.im * scale;
        }

        self.window.copy_within(self.block.., 0);
    }

    /// Drop all history: the next output starts from silence.
    pub fn reset(&mut self) {
        self.window.fill(0.0);
        for slot in &mut self.fdl {
            slot.fill(Complex::default());
        }
        for channel in &mut self.output {
            channel.fill(0.0);
        }
        self.fill = 0;
    }
}
