// NOTE: The capture path currently assumes 16-bit signed integer PCM.
// All capture, encoding and duration math is done against this format.
// If we need to support other sample formats, this will need to be parameterized.

#[derive(Debug, Clone, Copy)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    pub const BITS_PER_SAMPLE: u16 = 16;

    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Calculate number of samples for a given duration in seconds
    pub fn samples_for_duration(&self, seconds: f32) -> usize {
        (self.sample_rate as f32 * seconds) as usize
    }

    /// Duration in seconds represented by a sample count
    pub fn duration_for_samples(&self, samples: usize) -> f32 {
        samples as f32 / (self.sample_rate as f32 * self.channels as f32)
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
        }
    }
}
