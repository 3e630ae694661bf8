pub mod capture;
pub mod format;
pub mod playback;
pub mod sink;
pub mod wav_sink;

pub use capture::{AudioCapture, CaptureStream};
pub use format::AudioFormat;
pub use playback::{AudioHandle, AudioPayload, RecordedAudio};
pub use sink::AudioSink;
pub use wav_sink::WavSink;
