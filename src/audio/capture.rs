use super::format::AudioFormat;
use crate::error::PipelineError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use ringbuf::{HeapRb, traits::*};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc, oneshot};

/// Live capture stream plus the bridge flush trigger.
///
/// Field order matters: dropping this releases the device stream first, then
/// the flush sender. The dropped sender wakes the bridge task, which forwards
/// everything still in the ring buffer, including a final chunk below the
/// forwarding threshold, before exiting. No captured samples are stranded.
pub struct CaptureStream {
    _stream: cpal::Stream,
    _flush_tx: oneshot::Sender<()>,
}

pub struct AudioCapture;

impl AudioCapture {
    /// Start microphone capture
    ///
    /// Returns the stream which must be kept alive for capture to continue;
    /// dropping it releases the underlying device and flushes the bridge.
    /// Audio chunks are sent via chunk_tx in arrival order. Any device or
    /// permission failure surfaces as
    /// [`PipelineError::MicrophoneUnavailable`] and nothing is captured.
    pub fn start(
        format: AudioFormat,
        chunk_tx: mpsc::Sender<Vec<f32>>,
    ) -> Result<CaptureStream, PipelineError> {
        let ring = HeapRb::<f32>::new(format.samples_for_duration(60.0));
        let (mut producer, consumer) = ring.split();

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| PipelineError::MicrophoneUnavailable(
                "No input audio device available".to_string(),
            ))?;

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let notify = Arc::new(Notify::new());
        let notify_callback = notify.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    producer.push_slice(data);
                    notify_callback.notify_one();
                },
                move |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| {
                PipelineError::MicrophoneUnavailable(format!("Failed to build input stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            PipelineError::MicrophoneUnavailable(format!("Failed to start audio stream: {}", e))
        })?;

        let chunk_size = format.samples_for_duration(0.5);
        let (flush_tx, flush_rx) = oneshot::channel();
        tokio::task::spawn_local(Self::bridge_task(
            consumer, chunk_tx, chunk_size, notify, flush_rx,
        ));

        tracing::info!("Audio capture started");
        Ok(CaptureStream {
            _stream: stream,
            _flush_tx: flush_tx,
        })
    }

    async fn bridge_task(
        mut consumer: impl Consumer<Item = f32>,
        tx: mpsc::Sender<Vec<f32>>,
        chunk_size: usize,
        notify: Arc<Notify>,
        mut flush_rx: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = notify.notified() => {
                    let available = consumer.occupied_len();
                    if available >= chunk_size {
                        let mut chunk = vec![0.0f32; chunk_size];
                        let n = consumer.pop_slice(&mut chunk);
                        chunk.truncate(n);

                        if tx.send(chunk).await.is_err() {
                            break;
                        }
                    }
                }

                // The stream side is gone: forward whatever the device
                // delivered before teardown, partial chunk included.
                _ = &mut flush_rx => {
                    loop {
                        let available = consumer.occupied_len();
                        if available == 0 {
                            break;
                        }
                        let mut chunk = vec![0.0f32; available.min(chunk_size)];
                        let n = consumer.pop_slice(&mut chunk);
                        chunk.truncate(n);

                        if n == 0 || tx.send(chunk).await.is_err() {
                            break;
                        }
                    }
                    break;
                }
            }
        }
    }
}
