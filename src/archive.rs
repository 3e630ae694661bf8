//! Local archive of finalized recordings
//!
//! Writes each recording to a timestamp-named file, independent of the
//! transcription path. Archive failures are logged and never affect the
//! session outcome.

use crate::audio::RecordedAudio;
use crate::config::Config;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Directory recordings are archived to: the configured override, or
/// `<data_dir>/brainbridge/recordings`.
pub fn recordings_dir(config: &Config) -> Result<PathBuf> {
    if let Some(dir) = &config.archive_dir {
        return Ok(dir.clone());
    }

    dirs::data_dir()
        .map(|d| d.join("brainbridge").join("recordings"))
        .context("Could not determine user data directory")
}

/// Save one finalized recording, returning the path written.
pub fn save_recording(config: &Config, recorded: &RecordedAudio) -> Result<PathBuf> {
    let dir = recordings_dir(config)?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create recordings directory: {:?}", dir))?;

    let timestamp = recorded.started_at.format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("recording_{}.wav", timestamp));

    std::fs::write(&path, recorded.payload.bytes())
        .with_context(|| format!("Failed to write recording: {:?}", path))?;

    tracing::info!("Archived recording to {:?}", path);
    Ok(path)
}
