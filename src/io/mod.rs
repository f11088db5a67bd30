// Purpose - external interfaces: output buffers, sound banks, asset decoding

pub mod decode;
pub mod samples;

/// Channel buffers the engine renders into.
///
/// Two buffers receive left/right; a single buffer receives their average.
#[derive(Debug, Default)]
pub struct AudioOutput {
    pub buffers: Vec<Vec<f32>>,
}

impl AudioOutput {
    pub fn stereo(frames: usize) -> Self {
        Self {
            buffers: vec![vec![0.0; frames]; 2],
        }
    }

    pub fn mono(frames: usize) -> Self {
        Self {
            buffers: vec![vec![0.0; frames]],
        }
    }

    /// Frames per channel (the shortest buffer wins).
    pub fn frames(&self) -> usize {
        self.buffers.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn channels(&self) -> usize {
        self.buffers.len()
    }

    /// Resize every channel to `frames`, zero-filled.
    pub fn resize(&mut self, frames: usize) {
        for buffer in &mut self.buffers {
            buffer.clear();
            buffer.resize(frames, 0.0);
        }
    }

    /// Write `left`/`right` starting at `offset`. Extra channels beyond two
    /// repeat the right channel.
    pub fn write(&mut self, offset: usize, left: &[f32], right: &[f32]) {
        let end = offset + left.len();
        match self.buffers.as_mut_slice() {
            [] => {}
            [mono] => {
                for ((out, &l), &r) in mono[offset..end].iter_mut().zip(left).zip(right) {
                    *out = 0.5 * (l + r);
                }
            }
            [first, rest @ ..] => {
                first[offset..end].copy_from_slice(left);
                for buffer in rest {
                    buffer[offset..end].copy_from_slice(right);
                }
            }
        }
    }
}
