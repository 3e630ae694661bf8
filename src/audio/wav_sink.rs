use super::format::AudioFormat;
use super::sink::AudioSink;
use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// In-memory WAV encoder
///
/// Buffers incoming f32 chunks as 16-bit PCM in arrival order and encodes
/// them into one WAV payload on finalize. The whole recording stays in
/// memory until hand-off, so there is no file I/O on the capture path.
pub struct WavSink {
    format: AudioFormat,
    samples: Vec<i16>,
}

impl WavSink {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            samples: Vec::new(),
        }
    }

    pub fn samples_buffered(&self) -> usize {
        self.samples.len()
    }
}

impl AudioSink for WavSink {
    fn write_chunk(&mut self, samples: Vec<f32>) -> Result<()> {
        self.samples.extend(samples.into_iter().map(|sample| {
            // Convert f32 (-1.0 to 1.0) to i16
            (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
        }));
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<Vec<u8>> {
        let spec = WavSpec {
            channels: self.format.channels,
            sample_rate: self.format.sample_rate,
            bits_per_sample: AudioFormat::BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| anyhow::anyhow!("Failed to create WAV writer: {}", e))?;

        for sample in &self.samples {
            writer
                .write_sample(*sample)
                .map_err(|e| anyhow::anyhow!("Failed to write sample: {}", e))?;
        }

        writer
            .finalize()
            .map_err(|e| anyhow::anyhow!("Failed to finalize WAV: {}", e))?;

        Ok(cursor.into_inner())
    }
}
