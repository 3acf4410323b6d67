// Note recorder - Captures note-ons with their offset from the start of a take

use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One played note, `time_offset_ms` after the recording started
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedNoteEvent {
    pub note: String,
    #[serde(rename = "time")]
    pub time_offset_ms: f64,
}

impl RecordedNoteEvent {
    pub fn new(note: impl Into<String>, time_offset_ms: f64) -> Self {
        Self {
            note: note.into(),
            time_offset_ms,
        }
    }
}

/// Milliseconds between two clock readings, as a float
pub fn elapsed_ms(since: Duration, now: Duration) -> f64 {
    now.saturating_sub(since).as_nanos() as f64 / 1_000_000.0
}

#[derive(Debug, Default)]
pub struct Recorder {
    /// Clock reading at the start of the current take, `None` when idle
    started_at: Option<Duration>,
    events: Vec<RecordedNoteEvent>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.started_at.is_some()
    }

    /// Begin a new take. The previous sequence is discarded, never merged.
    pub fn start(&mut self, now: Duration) {
        if self.is_recording() {
            debug!("Restarting recording, previous take discarded");
        }
        self.events.clear();
        self.started_at = Some(now);
    }

    /// Append a note while recording. Arrival order is kept as is.
    pub fn record(&mut self, note: &str, now: Duration) -> bool {
        let Some(started_at) = self.started_at else {
            return false;
        };
        self.events
            .push(RecordedNoteEvent::new(note, elapsed_ms(started_at, now)));
        true
    }

    /// Freeze the take. Returns false if nothing was recording.
    pub fn stop(&mut self) -> bool {
        self.started_at.take().is_some()
    }

    /// Swap in a loaded sequence; any take in progress ends
    pub fn replace(&mut self, events: Vec<RecordedNoteEvent>) {
        self.started_at = None;
        self.events = events;
    }

    pub fn events(&self) -> &[RecordedNoteEvent] {
        &self.events
    }
}
