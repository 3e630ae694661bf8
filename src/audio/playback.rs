use chrono::{DateTime, Local};
use rodio::OutputStreamBuilder;
use std::io::Cursor;
use std::sync::Arc;

/// Finalized, sealed audio payload of one capture session.
///
/// The encoded bytes are shared (cheaply cloneable) so the upload client and
/// the history's playback handle can reference the same buffer; the buffer is
/// released once the last owner is dropped.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    bytes: Arc<[u8]>,
}

impl AudioPayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Create a playback reference over the same underlying buffer.
    pub fn handle(&self) -> AudioHandle {
        AudioHandle {
            bytes: self.bytes.clone(),
        }
    }
}

/// Playback reference to a finalized recording, owned by its history entry
/// so the audio stays playable for the entry's lifetime.
#[derive(Debug, Clone)]
pub struct AudioHandle {
    bytes: Arc<[u8]>,
}

impl AudioHandle {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Play the recording through the default output device, blocking a
    /// worker thread until it ends. Playback problems are logged, never
    /// propagated; the handle stays valid either way.
    pub async fn play(&self) {
        let bytes = self.bytes.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = play_blocking(bytes) {
                tracing::warn!("Failed to play recording: {}", e);
            }
        })
        .await
        .ok();
    }
}

fn play_blocking(bytes: Arc<[u8]>) -> Result<(), Box<dyn std::error::Error>> {
    let stream_handle = OutputStreamBuilder::open_default_stream()?;
    let sink = rodio::play(stream_handle.mixer(), Cursor::new(bytes))?;
    sink.sleep_until_end();
    Ok(())
}

/// One finalized capture session as handed off by the recorder
#[derive(Debug, Clone)]
pub struct RecordedAudio {
    pub session_id: u64,
    pub started_at: DateTime<Local>,
    pub payload: AudioPayload,
}
