pub mod mic_test;
pub mod recorder;

pub use mic_test::MicTest;
pub use recorder::{Recorder, RecorderHandle};
