use crate::audio::RecordedAudio;
use anyhow::Result;
use tokio::sync::oneshot;

/// Commands for the Recorder service
pub enum RecorderCommand {
    Start(oneshot::Sender<Result<()>>),
    /// Replies with the finalized audio, or `None` when nothing was recording.
    Stop(oneshot::Sender<Result<Option<RecordedAudio>>>),
}

/// Capture controller state (observable via watch channel)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
}

/// Mic self-test state (observable via watch channel)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MicTestState {
    Off,
    Testing,
    Error(String),
}

/// Phase of the post-recording upload sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusPhase {
    Idle,
    Uploading,
    Success,
    Error,
}

/// Status presented to the UI boundary: phase plus a human-readable message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadStatus {
    pub phase: StatusPhase,
    pub message: String,
}

impl UploadStatus {
    pub fn idle() -> Self {
        Self {
            phase: StatusPhase::Idle,
            message: String::new(),
        }
    }

    pub fn uploading() -> Self {
        Self {
            phase: StatusPhase::Uploading,
            message: "Uploading...".to_string(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            phase: StatusPhase::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            phase: StatusPhase::Error,
            message: message.into(),
        }
    }
}
