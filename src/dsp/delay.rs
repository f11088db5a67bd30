/// Circular buffer delay without feedback.
///
/// Capacity is fixed at construction so the audio thread never allocates.
/// A delay of zero samples passes the input straight through.
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
}

impl DelayLine {
    /// Delay line able to hold `max_delay_seconds` at `sample_rate`.
    pub fn new(max_delay_seconds: f32, sample_rate: f32) -> Self {
        let capacity = (max_delay_seconds.max(0.0) * sample_rate).ceil() as usize + 1;
        Self::with_capacity(capacity)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_pos: 0,
            delay_samples: 0,
        }
    }

    /// Longest delay in samples this line can produce.
    pub fn max_delay(&self) -> usize {
        self.buffer.len() - 1
    }

    pub fn set_delay(&mut self, delay_samples: usize) {
        self.delay_samples = delay_samples.min(self.max_delay());
    }

    /// Set the delay from seconds, rounded to the nearest sample.
    pub fn set_delay_seconds(&mut self, seconds: f32, sample_rate: f32) {
        let samples = (seconds.max(0.0) * sample_rate).round() as usize;
        self.set_delay(samples);
    }

    pub fn delay(&self) -> usize {
        self.delay_samples
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        let len = self.buffer.len();
        self.buffer[self.write_pos] = sample;

        let read_pos = (self.write_pos + len - self.delay_samples) % len;
        let delayed = self.buffer[read_pos];

        self.write_pos = (self.write_pos + 1) % len;

        delayed
    }

    /// Delay `input` into `output`.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        for (o, &x) in output.iter_mut().zip(input) {
            *o = self.next_sample(x);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
