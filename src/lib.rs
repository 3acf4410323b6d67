// Santoor - Library exports for the binary, tests and benchmarks

pub mod audio;
pub mod config;
pub mod input;
pub mod messaging;
pub mod sequencer;
pub mod session;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::device::CpalSink;
pub use audio::engine::{AudioSink, EngineError, EngineSettings, Instrument, SynthEngine};
pub use audio::export::{AudioExporter, ExportError, ExportSettings};
pub use audio::offline::{OfflineRenderer, OfflineSink};
pub use config::{ConfigError, Settings};
pub use input::{InputDispatcher, RepeatTick};
pub use messaging::channels::create_command_channel;
pub use sequencer::{
    Clock, ManualClock, PlaybackEvent, Player, RecordedNoteEvent, Recorder, Scheduler,
    SequenceError, SystemClock, TimerId, TransportState,
};
pub use session::{Session, SessionEvent};
pub use synth::notes::{NOTE_FREQUENCIES, OctaveShift, base_frequency};
pub use synth::voice::Voice;
