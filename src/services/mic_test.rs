use crate::audio::AudioFormat;
use crate::error::PipelineError;
use crate::messages::MicTestState;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use tokio::sync::watch;

/// Mic self-test: an independent Off → Testing → Off diagnostic stream
///
/// Deliberately separate from the recorder so a diagnostic never interferes
/// with a capture session in the state machine. Both do open the same
/// physical input device, so running the self-test during a recording may
/// fail on hosts that hand out the microphone exclusively; that contention
/// is documented rather than prevented.
pub struct MicTest {
    format: AudioFormat,
    state_tx: watch::Sender<MicTestState>,
    stream: Option<cpal::Stream>,
}

impl MicTest {
    pub fn new(format: AudioFormat, state_tx: watch::Sender<MicTestState>) -> Self {
        Self {
            format,
            state_tx,
            stream: None,
        }
    }

    pub fn is_testing(&self) -> bool {
        self.stream.is_some()
    }

    /// Single toggle surface: starts the test when off, stops it when on.
    pub fn toggle(&mut self) {
        if self.stream.is_some() {
            self.stop();
        } else {
            self.start();
        }
    }

    fn start(&mut self) {
        match Self::open_stream(self.format) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state_tx.send_replace(MicTestState::Testing);
                tracing::info!("Mic test started, microphone is working");
            }
            Err(e) => {
                tracing::error!("Mic test failed: {}", e);
                self.state_tx
                    .send_replace(MicTestState::Error(e.to_string()));
            }
        }
    }

    /// Releases the device stream. Safe to call when already off.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::info!("Mic test stopped");
        }
        self.state_tx.send_replace(MicTestState::Off);
    }

    fn open_stream(format: AudioFormat) -> Result<cpal::Stream, PipelineError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or_else(|| {
            PipelineError::MicrophoneUnavailable("No input audio device available".to_string())
        })?;

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        // Samples are discarded; the test only proves the device delivers audio.
        let stream = device
            .build_input_stream(
                &config,
                |_data: &[f32], _info: &cpal::InputCallbackInfo| {},
                |err| {
                    tracing::error!("Mic test stream error: {}", err);
                },
                None,
            )
            .map_err(|e| {
                PipelineError::MicrophoneUnavailable(format!("Failed to build input stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            PipelineError::MicrophoneUnavailable(format!("Failed to start audio stream: {}", e))
        })?;

        Ok(stream)
    }
}
