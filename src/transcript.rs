use crate::audio::AudioHandle;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// One speaker-attributed, time-bounded span of recognized text.
///
/// Segments are immutable once produced by the transcription service and are
/// kept in the chronological order the service returned them, never re-sorted
/// locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub speaker: String,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// One completed capture session: its transcription outcome plus the audio
/// handle, retained so playback stays possible for the entry's lifetime.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// 1-based, stable for the lifetime of the history
    pub session_index: usize,
    /// Possibly empty for degraded outcomes
    pub segments: Vec<TranscriptSegment>,
    /// Human-readable capture time
    pub timestamp: String,
    pub audio: AudioHandle,
}

#[derive(Default)]
struct Inner {
    current: Vec<TranscriptSegment>,
    history: Vec<HistoryEntry>,
}

/// Current transcript plus the append-only session history.
///
/// Cloneable handle over shared state; all mutations happen under one lock so
/// no reader ever observes a partially constructed entry. History only grows
/// via [`append_history`](Self::append_history) and only shrinks via the
/// all-or-nothing [`clear_history`](Self::clear_history).
#[derive(Clone, Default)]
pub struct TranscriptStore {
    inner: Arc<Mutex<Inner>>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current transcript view. No history effect.
    pub fn set_current(&self, segments: Vec<TranscriptSegment>) {
        self.inner.lock().unwrap().current = segments;
    }

    pub fn current(&self) -> Vec<TranscriptSegment> {
        self.inner.lock().unwrap().current.clone()
    }

    /// Append a history entry, assigning the next stable 1-based index.
    /// The entry is built and pushed under the lock, so the index and the
    /// push are atomic with respect to concurrent reads.
    pub fn append_history(
        &self,
        segments: Vec<TranscriptSegment>,
        timestamp: String,
        audio: AudioHandle,
    ) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let session_index = inner.history.len() + 1;
        inner.history.push(HistoryEntry {
            session_index,
            segments,
            timestamp,
            audio,
        });
        session_index
    }

    /// Empty the history atomically. The current transcript is untouched.
    pub fn clear_history(&self) {
        self.inner.lock().unwrap().history.clear();
    }

    /// History in storage (chronological) order.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inner.lock().unwrap().history.clone()
    }

    /// History as presented to the user: most recent first. This is a read
    /// transform, the storage order never changes.
    pub fn history_newest_first(&self) -> Vec<HistoryEntry> {
        let mut entries = self.history();
        entries.reverse();
        entries
    }

    pub fn history_len(&self) -> usize {
        self.inner.lock().unwrap().history.len()
    }
}
