// Melody player - Replays a recorded sequence through the scheduler
//
// `play` turns every event into a one-shot timer plus one end-of-playback
// sentinel. The player keeps every handle so `stop` can cancel all of them.

use log::debug;
use std::time::Duration;

use crate::sequencer::recorder::RecordedNoteEvent;
use crate::sequencer::scheduler::{Scheduler, TimerId};
use crate::synth::notes::OctaveShift;

/// Silence kept after the last note before playback counts as finished
pub const DEFAULT_PLAYBACK_TAIL: Duration = Duration::from_millis(500);

/// Timer payloads produced by the player
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Sound `note` at the octave in effect when playback started
    Note { note: String, octave: OctaveShift },
    /// End-of-playback sentinel
    Finished,
}

/// Offset in milliseconds to a delay. Negative and non-finite offsets play at once.
pub fn delay_from_ms(ms: f64) -> Duration {
    if ms.is_nan() || ms <= 0.0 {
        return Duration::ZERO;
    }
    // Float to int casts saturate, so huge offsets land far in the future
    Duration::from_nanos((ms * 1_000_000.0).round() as u64)
}

#[derive(Debug)]
pub struct Player {
    tail: Duration,
    pending: Vec<TimerId>,
    sentinel: Option<TimerId>,
}

impl Player {
    pub fn new() -> Self {
        Self::with_tail(DEFAULT_PLAYBACK_TAIL)
    }

    pub fn with_tail(tail: Duration) -> Self {
        Self {
            tail,
            pending: Vec::new(),
            sentinel: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.sentinel.is_some()
    }

    /// Schedule every event of `sequence` relative to `now`.
    ///
    /// Returns false, leaving any current playback alone, if the sequence is
    /// empty. A playback already running is stopped first.
    pub fn play<E>(
        &mut self,
        sequence: &[RecordedNoteEvent],
        octave: OctaveShift,
        scheduler: &mut Scheduler<E>,
        now: Duration,
    ) -> bool
    where
        E: From<PlaybackEvent> + Clone,
    {
        if sequence.is_empty() {
            debug!("Nothing to play");
            return false;
        }
        self.stop(scheduler);

        self.pending = sequence
            .iter()
            .map(|event| {
                let payload = PlaybackEvent::Note {
                    note: event.note.clone(),
                    octave,
                };
                scheduler.schedule_once(now, delay_from_ms(event.time_offset_ms), payload.into())
            })
            .collect();

        let last = sequence
            .iter()
            .map(|event| delay_from_ms(event.time_offset_ms))
            .max()
            .unwrap_or_default();
        self.sentinel = Some(scheduler.schedule_once(
            now,
            last.saturating_add(self.tail),
            PlaybackEvent::Finished.into(),
        ));

        debug!("Playback scheduled: {} notes, {:?} long", sequence.len(), last);
        true
    }

    /// Cancel every pending note and the sentinel. Safe when idle.
    pub fn stop<E: Clone>(&mut self, scheduler: &mut Scheduler<E>) -> bool {
        for id in self.pending.drain(..) {
            scheduler.cancel(id);
        }
        match self.sentinel.take() {
            Some(id) => {
                scheduler.cancel(id);
                true
            }
            None => false,
        }
    }

    /// Handle a fired sentinel. Sentinels of superseded playbacks are ignored.
    pub fn finish(&mut self, timer: TimerId) -> bool {
        if self.sentinel != Some(timer) {
            return false;
        }
        self.sentinel = None;
        self.pending.clear();
        true
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}
