use crate::archive;
use crate::audio::{AudioFormat, RecordedAudio};
use crate::config::Config;
use crate::messages::{CaptureState, MicTestState, UploadStatus};
use crate::services::{MicTest, Recorder, RecorderHandle};
use crate::transcript::TranscriptStore;
use crate::transcription::{HttpTranscriber, TRANSCRIPTION_UNAVAILABLE, Transcriber, UploadOutcome};

use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Session controller: wires capture, upload and the transcript store
///
/// Drives the per-recording sequence: toggle capture → on stop mark
/// `Uploading` → upload → set current transcript → append exactly one history
/// entry → mark `Success`/`Error`. Every failure is converted into a status
/// message here; nothing propagates to the presentation layer and no failure
/// is fatal to the next recording.
///
/// Holds the mic self-test's cpal stream, so the controller is !Send and must
/// live on the LocalSet that also runs the recorder.
pub struct App {
    config: Arc<Config>,
    store: TranscriptStore,
    recorder: RecorderHandle,
    transcriber: Box<dyn Transcriber>,
    mic_test: MicTest,
    capture_rx: watch::Receiver<CaptureState>,
    mic_rx: watch::Receiver<MicTestState>,
    status_tx: watch::Sender<UploadStatus>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let format = AudioFormat::new(config.sample_rate, config.channels);

        let (recorder, capture_rx) = Self::setup_audio_pipeline(format);
        let transcriber = Box::new(HttpTranscriber::new(config.clone())?);

        let (mic_tx, mic_rx) = watch::channel(MicTestState::Off);
        let mic_test = MicTest::new(format, mic_tx);

        let (status_tx, _) = watch::channel(UploadStatus::idle());

        Ok(Self {
            config,
            store: TranscriptStore::new(),
            recorder,
            transcriber,
            mic_test,
            capture_rx,
            mic_rx,
            status_tx,
        })
    }

    fn setup_audio_pipeline(
        format: AudioFormat,
    ) -> (RecorderHandle, watch::Receiver<CaptureState>) {
        let (audio_tx, audio_rx) = mpsc::channel(100);
        let (state_tx, state_rx) = watch::channel(CaptureState::Idle);

        // Create and spawn Recorder (using spawn_local because it's !Send)
        let (recorder_tx, recorder_rx) = mpsc::channel(10);
        let recorder = Recorder::new(format, recorder_rx, audio_rx, audio_tx, state_tx);
        tokio::task::spawn_local(recorder.run());

        (RecorderHandle::new(recorder_tx), state_rx)
    }

    // --- presentation boundary (readers/triggers only) ---

    pub fn capture_state(&self) -> watch::Receiver<CaptureState> {
        self.capture_rx.clone()
    }

    pub fn mic_test_state(&self) -> watch::Receiver<MicTestState> {
        self.mic_rx.clone()
    }

    pub fn status(&self) -> watch::Receiver<UploadStatus> {
        self.status_tx.subscribe()
    }

    pub fn store(&self) -> TranscriptStore {
        self.store.clone()
    }

    pub fn clear_history(&self) {
        self.store.clear_history();
        tracing::info!("Transcript history cleared");
    }

    /// Play back the most recent recording, if any.
    pub async fn play_last_recording(&self) {
        let Some(entry) = self.store.history_newest_first().into_iter().next() else {
            tracing::info!("No recording to play");
            return;
        };
        tracing::info!(session_index = entry.session_index, "Playing recording");
        entry.audio.play().await;
    }

    /// The single record toggle: effect depends on the current capture state.
    pub async fn toggle_recording(&mut self) {
        let state = *self.capture_rx.borrow();
        tracing::debug!("toggle_recording: current state = {:?}", state);

        match state {
            CaptureState::Idle => self.handle_start_recording().await,
            CaptureState::Recording => self.handle_stop_and_upload().await,
        }
    }

    pub fn toggle_mic_test(&mut self) {
        self.mic_test.toggle();
    }

    /// Releases any device streams still held. Safe to call repeatedly.
    pub async fn shutdown(&mut self) {
        self.mic_test.stop();
        if *self.capture_rx.borrow() == CaptureState::Recording {
            if let Err(e) = self.recorder.stop().await {
                tracing::warn!("Failed to stop recording during shutdown: {}", e);
            }
        }
    }

    async fn handle_start_recording(&mut self) {
        tracing::info!("Starting recording");
        self.status_tx.send_replace(UploadStatus::idle());

        if let Err(e) = self.recorder.start().await {
            tracing::error!("Error starting recording: {}", e);
            self.status_tx
                .send_replace(UploadStatus::error("Error accessing microphone"));
        }
    }

    async fn handle_stop_and_upload(&mut self) {
        tracing::info!("Stopping recording");

        let recorded = match self.recorder.stop().await {
            Ok(Some(recorded)) => recorded,
            Ok(None) => {
                tracing::debug!("Nothing was recording, ignoring");
                return;
            }
            Err(e) => {
                tracing::error!("Error finalizing recording: {}", e);
                self.status_tx
                    .send_replace(UploadStatus::error("Error processing recording"));
                return;
            }
        };

        tracing::info!(
            session_id = recorded.session_id,
            bytes = recorded.payload.len(),
            "Recording finalized"
        );

        if self.config.archive_recordings {
            if let Err(e) = archive::save_recording(&self.config, &recorded) {
                tracing::warn!("Failed to archive recording: {}", e);
            }
        }

        complete_session(
            self.transcriber.as_ref(),
            &self.store,
            &self.status_tx,
            recorded,
        )
        .await;
    }
}

/// Run the post-recording sequence for one finalized session.
///
/// Strict order: status goes to Uploading before the attempt, the current
/// transcript and exactly one history entry are written for every outcome
/// variant (the audio handle is preserved even when transcription degraded),
/// and only then does the status land on Success or Error.
async fn complete_session(
    transcriber: &dyn Transcriber,
    store: &TranscriptStore,
    status_tx: &watch::Sender<UploadStatus>,
    recorded: RecordedAudio,
) {
    status_tx.send_replace(UploadStatus::uploading());

    let outcome = transcriber.upload(&recorded.payload).await;

    let audio = recorded.payload.handle();
    let timestamp = Local::now().format("%H:%M:%S").to_string();

    let status = match outcome {
        UploadOutcome::Success(segments) => {
            store.set_current(segments.clone());
            store.append_history(segments, timestamp, audio);
            UploadStatus::success("Recording uploaded successfully!")
        }
        UploadOutcome::ServiceUnavailable(placeholder) => {
            tracing::warn!("Transcription degraded: {}", placeholder);
            store.set_current(Vec::new());
            store.append_history(Vec::new(), timestamp, audio);
            UploadStatus::error(placeholder)
        }
        UploadOutcome::Failure(detail) => {
            tracing::error!("Upload failed: {}", detail);
            store.set_current(Vec::new());
            store.append_history(Vec::new(), timestamp, audio);
            // Same messaging as the unreachable case: to the user this is a
            // degraded transcription, and the recording is kept either way
            UploadStatus::error(TRANSCRIPTION_UNAVAILABLE)
        }
    };

    status_tx.send_replace(status);
}
