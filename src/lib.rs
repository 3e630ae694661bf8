pub mod app;
pub mod archive;
pub mod audio;
pub mod config;
pub mod error;
pub mod messages;
pub mod services;
pub mod transcript;
pub mod transcription;

pub use app::App;
pub use config::Config;
pub use error::PipelineError;
pub use messages::{CaptureState, MicTestState, StatusPhase, UploadStatus};
pub use transcript::{HistoryEntry, TranscriptSegment, TranscriptStore};
pub use transcription::{Transcriber, UploadOutcome};
