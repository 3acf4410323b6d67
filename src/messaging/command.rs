// Command types - Control side → audio thread

/// Messages the mixer drains at the start of every rendered block.
///
/// Gain levels do not travel here; they are shared through atomics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Start a new voice at an already resolved frequency (Hz)
    NoteOn { frequency: f32 },
}
