use crate::audio::{
    AudioCapture, AudioFormat, AudioPayload, AudioSink, CaptureStream, RecordedAudio, WavSink,
};
use crate::messages::{CaptureState, RecorderCommand};
use anyhow::Result;
use chrono::{DateTime, Local};
use tokio::sync::{mpsc, watch};

/// One in-flight recording session. Owns the raw audio buffer exclusively
/// until the session is finalized on stop.
struct ActiveSession {
    id: u64,
    started_at: DateTime<Local>,
    sink: Box<dyn AudioSink>,
}

/// Capture controller: coordinates microphone capture and encoding
///
/// This service:
/// - Manages AudioCapture lifecycle (Idle → Recording → Idle, reusable)
/// - Receives audio chunks via channel and buffers them into the session sink
/// - Seals the buffer into one finalized payload on stop
/// - Publishes every state transition on a watch channel
///
/// At most one session is active at a time; a start while recording is
/// rejected as a no-op so two captures can never run concurrently. Note:
/// this service holds cpal::Stream which is !Send, so it must be spawned
/// on a LocalSet using tokio::task::spawn_local.
pub struct Recorder {
    format: AudioFormat,
    cmd_rx: mpsc::Receiver<RecorderCommand>,
    audio_rx: mpsc::Receiver<Vec<f32>>,
    audio_tx: mpsc::Sender<Vec<f32>>,
    state_tx: watch::Sender<CaptureState>,
    stream: Option<CaptureStream>,
    session: Option<ActiveSession>,
    next_session_id: u64,
}

impl Recorder {
    pub fn new(
        format: AudioFormat,
        cmd_rx: mpsc::Receiver<RecorderCommand>,
        audio_rx: mpsc::Receiver<Vec<f32>>,
        audio_tx: mpsc::Sender<Vec<f32>>,
        state_tx: watch::Sender<CaptureState>,
    ) -> Self {
        Self {
            format,
            cmd_rx,
            audio_rx,
            audio_tx,
            state_tx,
            stream: None,
            session: None,
            next_session_id: 1,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                // Handle commands from the session controller
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        // Controller gone, nothing can command us anymore
                        None => break,
                    }
                }

                // Buffer audio chunks in arrival order (only while recording)
                Some(chunk) = self.audio_rx.recv(), if self.session.is_some() => {
                    if let Some(session) = self.session.as_mut() {
                        if let Err(e) = session.sink.write_chunk(chunk) {
                            tracing::error!("Failed to buffer audio chunk: {}", e);
                        }
                    }
                }
            }
        }
    }

    async fn handle_command(&mut self, cmd: RecorderCommand) {
        match cmd {
            RecorderCommand::Start(reply) => {
                if self.session.is_some() {
                    tracing::warn!("Start requested while already recording, ignoring");
                    let _ = reply.send(Ok(()));
                    return;
                }

                // Acquire the device before committing to a session; a denial
                // leaves us Idle with nothing captured.
                match AudioCapture::start(self.format, self.audio_tx.clone()) {
                    Ok(stream) => {
                        let id = self.next_session_id;
                        self.next_session_id += 1;

                        self.stream = Some(stream);
                        self.session = Some(ActiveSession {
                            id,
                            started_at: Local::now(),
                            sink: Box::new(WavSink::new(self.format)),
                        });
                        self.state_tx.send_replace(CaptureState::Recording);
                        tracing::info!(session_id = id, "Recording started");
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        tracing::error!("Failed to start capture: {}", e);
                        let _ = reply.send(Err(e.into()));
                    }
                }
            }

            RecorderCommand::Stop(reply) => {
                let Some(mut session) = self.session.take() else {
                    tracing::debug!("Stop requested while idle, ignoring");
                    let _ = reply.send(Ok(None));
                    return;
                };

                // Drop the stream first: this releases the device even if the
                // caller never consumes the finalized audio, and signals the
                // bridge task to flush the ring-buffer residue and exit.
                self.stream = None;

                // Give the bridge a moment to forward the final partial chunk
                tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

                // Drain everything the bridge forwarded into the sink
                while let Ok(chunk) = self.audio_rx.try_recv() {
                    if let Err(e) = session.sink.write_chunk(chunk) {
                        tracing::error!("Failed to buffer audio chunk during drain: {}", e);
                        break;
                    }
                }

                // Replace the audio channel with a fresh one so a late chunk
                // from this session can never leak into the next
                let (new_audio_tx, new_audio_rx) = mpsc::channel(100);
                self.audio_tx = new_audio_tx;
                self.audio_rx = new_audio_rx;

                let result = session.sink.finalize().map(|bytes| {
                    Some(RecordedAudio {
                        session_id: session.id,
                        started_at: session.started_at,
                        payload: AudioPayload::new(bytes),
                    })
                });

                self.state_tx.send_replace(CaptureState::Idle);
                let _ = reply.send(result);

                tracing::info!(session_id = session.id, "Recording stopped");
            }
        }
    }
}

/// Handle for communicating with the Recorder
#[derive(Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<RecorderCommand>,
}

impl RecorderHandle {
    pub fn new(tx: mpsc::Sender<RecorderCommand>) -> Self {
        Self { tx }
    }

    pub async fn start(&self) -> Result<()> {
        let (reply, rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(RecorderCommand::Start(reply))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send start command: {}", e))?;

        rx.await
            .map_err(|e| anyhow::anyhow!("Failed to receive start response: {}", e))?
    }

    /// Returns the finalized audio of the session, or `None` when nothing
    /// was recording (stop while idle is a no-op).
    pub async fn stop(&self) -> Result<Option<RecordedAudio>> {
        let (reply, rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(RecorderCommand::Stop(reply))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send stop command: {}", e))?;

        rx.await
            .map_err(|e| anyhow::anyhow!("Failed to receive stop response: {}", e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    fn recorder_for_test() -> (Recorder, watch::Receiver<CaptureState>) {
        let (_cmd_tx, cmd_rx) = mpsc::channel(1);
        let (audio_tx, audio_rx) = mpsc::channel(100);
        let (state_tx, state_rx) = watch::channel(CaptureState::Idle);
        let recorder = Recorder::new(
            AudioFormat::default(),
            cmd_rx,
            audio_rx,
            audio_tx,
            state_tx,
        );
        (recorder, state_rx)
    }

    #[tokio::test]
    async fn stop_while_idle_is_a_no_op() {
        let (mut recorder, state_rx) = recorder_for_test();

        let (reply, rx) = oneshot::channel();
        recorder.handle_command(RecorderCommand::Stop(reply)).await;

        assert!(rx.await.unwrap().unwrap().is_none());
        assert_eq!(*state_rx.borrow(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn stop_finalizes_exactly_one_payload() {
        let (mut recorder, state_rx) = recorder_for_test();

        // Simulate an active session without touching the device
        let mut sink = Box::new(WavSink::new(AudioFormat::default()));
        sink.write_chunk(vec![0.1; 8000]).unwrap();
        recorder.session = Some(ActiveSession {
            id: 7,
            started_at: Local::now(),
            sink,
        });
        recorder.state_tx.send_replace(CaptureState::Recording);

        let (reply, rx) = oneshot::channel();
        recorder.handle_command(RecorderCommand::Stop(reply)).await;

        let recorded = rx.await.unwrap().unwrap().expect("payload expected");
        assert_eq!(recorded.session_id, 7);
        assert!(recorded.payload.len() > 0);
        assert_eq!(*state_rx.borrow(), CaptureState::Idle);

        // A second stop must not produce a duplicate payload
        let (reply, rx) = oneshot::channel();
        recorder.handle_command(RecorderCommand::Stop(reply)).await;
        assert!(rx.await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn run_exits_when_the_controller_is_dropped() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let (cmd_tx, cmd_rx) = mpsc::channel(1);
                let (audio_tx, audio_rx) = mpsc::channel(100);
                let (state_tx, _state_rx) = watch::channel(CaptureState::Idle);
                let recorder = Recorder::new(
                    AudioFormat::default(),
                    cmd_rx,
                    audio_rx,
                    audio_tx,
                    state_tx,
                );
                let handle = tokio::task::spawn_local(recorder.run());

                drop(cmd_tx);

                // The loop must end cleanly, not panic with no live branches
                tokio::time::timeout(std::time::Duration::from_secs(1), handle)
                    .await
                    .expect("recorder did not exit")
                    .unwrap();
            })
            .await;
    }
}
