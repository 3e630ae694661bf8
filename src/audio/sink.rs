use anyhow::Result;

/// Trait for buffering audio encoding
///
/// Implementations encode audio samples to a container format (WAV today)
/// as chunks arrive, and seal the result into one finalized byte payload on
/// stop. A sink is single-use: after `finalize` it accepts no further writes.
pub trait AudioSink: Send {
    /// Write audio samples (called repeatedly during recording).
    /// The Vec is moved to avoid copying.
    fn write_chunk(&mut self, samples: Vec<f32>) -> Result<()>;

    /// Seal the sink and return the finalized encoded payload bytes.
    fn finalize(self: Box<Self>) -> Result<Vec<u8>>;
}
