// Sequencer - Recording, scheduling, playback and persistence of melodies

pub mod persistence;
pub mod player;
pub mod recorder;
pub mod scheduler;
pub mod transport;

pub use persistence::{SequenceError, deserialize, serialize};
pub use player::{PlaybackEvent, Player};
pub use recorder::{RecordedNoteEvent, Recorder};
pub use scheduler::{Clock, ManualClock, Scheduler, SystemClock, TimerId};
pub use transport::TransportState;
