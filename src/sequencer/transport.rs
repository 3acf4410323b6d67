// Transport - What the session is doing right now
// Recording and playback exclude each other by construction: one state at a time.

/// Transport state (stop/play/record)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    /// A recorded melody is being replayed
    Playing,
    /// Note-ons are being captured
    Recording,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, TransportState::Recording)
    }
}
