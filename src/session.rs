// Session - Application state owner
//
// Wires input, recording, playback and the instrument together. Everything
// runs on the caller's thread: input methods act immediately, timers advance
// only when `tick` is called.
//
// Invariants:
// - recording and playback never run at the same time (one TransportState);
// - every pending timer is owned by the player or the input dispatcher and is
//   cancelled on stop, release, new recording and load;
// - the instrument is initialized lazily by the first note, and gets the
//   session's volume and reverb at that moment.

use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use crate::audio::engine::Instrument;
use crate::config::Settings;
use crate::input::dispatcher::{InputDispatcher, RepeatTick};
use crate::sequencer::persistence::{self, SequenceError};
use crate::sequencer::player::{PlaybackEvent, Player};
use crate::sequencer::recorder::{RecordedNoteEvent, Recorder};
use crate::sequencer::scheduler::{Clock, Scheduler};
use crate::sequencer::transport::TransportState;
use crate::synth::notes::{OctaveShift, base_frequency};

/// Everything the session schedules
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Playback(PlaybackEvent),
    PointerRepeat,
}

impl From<PlaybackEvent> for SessionEvent {
    fn from(event: PlaybackEvent) -> Self {
        SessionEvent::Playback(event)
    }
}

impl From<RepeatTick> for SessionEvent {
    fn from(_: RepeatTick) -> Self {
        SessionEvent::PointerRepeat
    }
}

pub struct Session<I: Instrument, C: Clock> {
    engine: I,
    clock: C,
    scheduler: Scheduler<SessionEvent>,
    recorder: Recorder,
    player: Player,
    input: InputDispatcher,
    transport: TransportState,
    octave: OctaveShift,
    volume: f32,
    reverb: f32,
}

impl<I: Instrument, C: Clock> Session<I, C> {
    pub fn new(engine: I, clock: C) -> Self {
        Self::with_settings(engine, clock, &Settings::default())
    }

    pub fn with_settings(engine: I, clock: C, settings: &Settings) -> Self {
        Self {
            engine,
            clock,
            scheduler: Scheduler::new(),
            recorder: Recorder::new(),
            player: Player::with_tail(settings.playback_tail()),
            input: InputDispatcher::with_repeat_period(settings.pointer_repeat()),
            transport: TransportState::Stopped,
            octave: settings.octave_shift(),
            volume: settings.volume,
            reverb: settings.reverb,
        }
    }

    pub fn engine(&self) -> &I {
        &self.engine
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    pub fn is_recording(&self) -> bool {
        self.transport.is_recording()
    }

    /// The current melody: the last take, or the last loaded file
    pub fn recorded(&self) -> &[RecordedNoteEvent] {
        self.recorder.events()
    }

    pub fn octave(&self) -> OctaveShift {
        self.octave
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn reverb(&self) -> f32 {
        self.reverb
    }

    pub fn active_notes(&self) -> BTreeSet<&str> {
        self.input.active_notes()
    }

    pub fn bindings(&self) -> &'static [(char, &'static str)] {
        self.input.bindings()
    }

    /// When `tick` next has something to do
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Initialize the instrument if needed. False if audio is unavailable.
    pub fn ensure_engine(&mut self) -> bool {
        if self.engine.is_initialized() {
            return true;
        }
        match self.engine.initialize() {
            Ok(()) => {
                self.engine.set_volume(self.volume);
                self.engine.set_reverb(self.reverb);
                true
            }
            Err(e) => {
                warn!("Audio unavailable, notes will be silent: {}", e);
                false
            }
        }
    }

    /// Sound a note at the current octave and capture it if recording.
    ///
    /// Unknown notes are ignored entirely, including by the recorder.
    pub fn note_on(&mut self, note: &str) -> Option<f32> {
        if base_frequency(note).is_none() {
            debug!("Ignoring unknown note {:?}", note);
            return None;
        }
        self.ensure_engine();
        let frequency = self.engine.play_note(note, self.octave);
        if self.transport.is_recording() {
            self.recorder.record(note, self.clock.now());
        }
        frequency
    }

    // ---------- Transport ----------

    /// Start a new take, discarding the current melody. Stops playback first.
    pub fn start_recording(&mut self) {
        self.stop();
        self.recorder.start(self.clock.now());
        self.transport = TransportState::Recording;
        info!("Recording started");
    }

    pub fn stop_recording(&mut self) -> bool {
        if !self.recorder.stop() {
            return false;
        }
        self.transport = TransportState::Stopped;
        info!("Recording stopped: {} notes", self.recorder.events().len());
        true
    }

    /// Returns whether recording is on afterwards
    pub fn toggle_recording(&mut self) -> bool {
        if self.is_recording() {
            self.stop_recording();
        } else {
            self.start_recording();
        }
        self.is_recording()
    }

    /// Replay the current melody. Ends any recording first; false if empty.
    pub fn play(&mut self) -> bool {
        self.stop_recording();
        let now = self.clock.now();
        let started = self
            .player
            .play(self.recorder.events(), self.octave, &mut self.scheduler, now);
        if started {
            self.transport = TransportState::Playing;
        }
        started
    }

    /// Stop playback, cancelling every note still pending
    pub fn stop(&mut self) -> bool {
        let stopped = self.player.stop(&mut self.scheduler);
        if self.transport.is_playing() {
            self.transport = TransportState::Stopped;
        }
        stopped
    }

    // ---------- Persistence ----------

    /// Save the melody. `Ok(false)` if there is nothing to save.
    pub fn save(&self, path: &Path) -> Result<bool, SequenceError> {
        persistence::save_to_file(path, self.recorder.events())
    }

    /// Replace the melody with a parsed one. On error nothing changes.
    pub fn load_str(&mut self, text: &str) -> Result<usize, SequenceError> {
        let sequence = persistence::deserialize(text)?;
        Ok(self.install(sequence))
    }

    pub fn load_file(&mut self, path: &Path) -> Result<usize, SequenceError> {
        let sequence = persistence::load_from_file(path)?;
        Ok(self.install(sequence))
    }

    fn install(&mut self, sequence: Vec<RecordedNoteEvent>) -> usize {
        self.stop();
        self.recorder.replace(sequence);
        self.transport = TransportState::Stopped;
        self.recorder.events().len()
    }

    // ---------- Levels ----------

    pub fn set_volume(&mut self, level: f32) {
        self.volume = level;
        self.engine.set_volume(level);
    }

    pub fn set_reverb(&mut self, level: f32) {
        self.reverb = level;
        self.engine.set_reverb(level);
    }

    /// Set the octave, clamped to the instrument's range
    pub fn set_octave(&mut self, shift: i32) -> OctaveShift {
        self.octave = OctaveShift::clamped(shift);
        self.octave
    }

    pub fn shift_octave(&mut self, delta: i32) -> OctaveShift {
        self.set_octave(self.octave.value() as i32 + delta)
    }

    // ---------- Input ----------

    pub fn key_down(&mut self, key: &str) -> Option<&'static str> {
        let note = self.input.key_down(key)?;
        self.note_on(note);
        Some(note)
    }

    pub fn key_up(&mut self, key: &str) {
        self.input.key_up(key);
    }

    pub fn pointer_down(&mut self, note: &str) {
        let now = self.clock.now();
        let note = self.input.pointer_down(note, &mut self.scheduler, now);
        self.note_on(&note);
    }

    pub fn pointer_enter(&mut self, note: &str) {
        let now = self.clock.now();
        if let Some(note) = self.input.pointer_enter(note, &mut self.scheduler, now) {
            self.note_on(&note);
        }
    }

    pub fn pointer_up(&mut self) {
        self.input.pointer_up(&mut self.scheduler);
    }

    pub fn pointer_leave(&mut self) {
        self.input.pointer_leave(&mut self.scheduler);
    }

    // ---------- Timers ----------

    /// Dispatch every timer due by now. Returns how many fired.
    pub fn tick(&mut self) -> usize {
        let due = self.scheduler.poll(self.clock.now());
        let count = due.len();

        for (timer, event) in due {
            match event {
                SessionEvent::Playback(PlaybackEvent::Note { note, octave }) => {
                    self.ensure_engine();
                    self.engine.play_note(&note, octave);
                }
                SessionEvent::Playback(PlaybackEvent::Finished) => {
                    if self.player.finish(timer) && self.transport.is_playing() {
                        self.transport = TransportState::Stopped;
                        debug!("Playback finished");
                    }
                }
                SessionEvent::PointerRepeat => {
                    if let Some(note) = self.input.repeat_fired(timer).map(str::to_owned) {
                        self.note_on(&note);
                    }
                }
            }
        }

        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::EngineError;
    use crate::sequencer::scheduler::ManualClock;

    /// Instrument double that records every call
    #[derive(Default)]
    struct Recording {
        ready: bool,
        init_calls: usize,
        played: Vec<(String, i8)>,
        levels: Vec<(&'static str, f32)>,
    }

    impl Instrument for Recording {
        fn initialize(&mut self) -> Result<(), EngineError> {
            self.init_calls += 1;
            self.ready = true;
            Ok(())
        }

        fn is_initialized(&self) -> bool {
            self.ready
        }

        fn play_note(&mut self, note: &str, octave: OctaveShift) -> Option<f32> {
            let frequency = base_frequency(note).map(|f| octave.apply(f))?;
            self.played.push((note.to_string(), octave.value()));
            Some(frequency)
        }

        fn set_volume(&mut self, level: f32) {
            self.levels.push(("volume", level));
        }

        fn set_reverb(&mut self, level: f32) {
            self.levels.push(("reverb", level));
        }
    }

    fn session() -> (Session<Recording, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (Session::new(Recording::default(), clock.clone()), clock)
    }

    #[test]
    fn test_first_note_initializes_with_stored_levels() {
        let (mut session, _clock) = session();
        assert_eq!(session.note_on("A4"), Some(440.0));
        session.note_on("B4");

        let engine = session.engine();
        assert_eq!(engine.init_calls, 1);
        assert_eq!(engine.levels, vec![("volume", 0.7), ("reverb", 0.3)]);
    }

    #[test]
    fn test_octave_is_clamped_and_applied() {
        let (mut session, _clock) = session();
        assert_eq!(session.shift_octave(1).value(), 1);
        assert_eq!(session.shift_octave(5).value(), 2);
        assert_eq!(session.note_on("A4"), Some(1760.0));
        assert_eq!(session.set_octave(-9).value(), -2);
        assert_eq!(session.note_on("A4"), Some(110.0));
    }

    #[test]
    fn test_key_repeat_plays_once() {
        let (mut session, _clock) = session();
        assert_eq!(session.key_down("h"), Some("A4"));
        assert_eq!(session.key_down("h"), None);
        session.key_up("h");
        assert_eq!(session.key_down("h"), Some("A4"));
        assert_eq!(session.engine().played.len(), 2);
    }

    #[test]
    fn test_pointer_hold_restrikes_until_release() {
        let (mut session, clock) = session();
        session.pointer_down("C4");
        clock.advance_ms(50);
        session.tick();
        clock.advance_ms(50);
        session.tick();
        session.pointer_enter("D4");
        clock.advance_ms(50);
        session.tick();
        session.pointer_up();
        clock.advance_ms(500);
        session.tick();

        let played: Vec<&str> = session.engine().played.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(played, vec!["C4", "C4", "C4", "D4", "D4"]);
        assert_eq!(session.next_deadline(), None);
    }
}
