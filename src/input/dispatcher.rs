// Input dispatcher - Raw key and pointer signals to note-on events
//
// Keys: one note-on per press. Auto-repeat (down while already down) is
// swallowed until the key is released.
//
// Pointer: pressing on a string sounds it at once and keeps re-striking it on a
// repeating timer. Sliding onto another string while pressed moves the
// re-strike to that string and sounds it (glissando). Release or leaving the
// instrument stops it.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use crate::input::keymap::{KEY_BINDINGS, key_char, note_for_key};
use crate::sequencer::scheduler::{Scheduler, TimerId};

/// Default re-strike period while the pointer is held
pub const DEFAULT_REPEAT_PERIOD: Duration = Duration::from_millis(50);

/// Timer payload for pointer re-strikes. The dispatcher maps the timer back to
/// its note in [`InputDispatcher::repeat_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTick;

#[derive(Debug)]
struct PointerHold {
    note: String,
    timer: TimerId,
}

#[derive(Debug)]
pub struct InputDispatcher {
    held_keys: HashMap<char, &'static str>,
    pointer: Option<PointerHold>,
    repeat_period: Duration,
}

impl InputDispatcher {
    pub fn new() -> Self {
        Self::with_repeat_period(DEFAULT_REPEAT_PERIOD)
    }

    pub fn with_repeat_period(repeat_period: Duration) -> Self {
        Self {
            held_keys: HashMap::new(),
            pointer: None,
            repeat_period,
        }
    }

    /// Note to sound for a key press, `None` for unbound keys and auto-repeat
    pub fn key_down(&mut self, key: &str) -> Option<&'static str> {
        let note = note_for_key(key)?;
        let c = key_char(key)?;
        if self.held_keys.insert(c, note).is_some() {
            return None;
        }
        Some(note)
    }

    /// Release a key. Returns the note it was holding.
    pub fn key_up(&mut self, key: &str) -> Option<&'static str> {
        self.held_keys.remove(&key_char(key)?)
    }

    /// Press on a string: sounds it now and starts re-striking it
    pub fn pointer_down<E>(&mut self, note: &str, scheduler: &mut Scheduler<E>, now: Duration) -> String
    where
        E: From<RepeatTick> + Clone,
    {
        self.release_pointer(scheduler);
        let timer = scheduler.schedule_repeating(now, self.repeat_period, RepeatTick.into());
        self.pointer = Some(PointerHold {
            note: note.to_string(),
            timer,
        });
        note.to_string()
    }

    /// Pointer moved onto a string. Only acts while pressed.
    pub fn pointer_enter<E>(
        &mut self,
        note: &str,
        scheduler: &mut Scheduler<E>,
        now: Duration,
    ) -> Option<String>
    where
        E: From<RepeatTick> + Clone,
    {
        self.pointer.as_ref()?;
        Some(self.pointer_down(note, scheduler, now))
    }

    pub fn pointer_up<E: Clone>(&mut self, scheduler: &mut Scheduler<E>) -> bool {
        self.release_pointer(scheduler)
    }

    /// Pointer left the instrument: same as a release
    pub fn pointer_leave<E: Clone>(&mut self, scheduler: &mut Scheduler<E>) -> bool {
        self.release_pointer(scheduler)
    }

    fn release_pointer<E: Clone>(&mut self, scheduler: &mut Scheduler<E>) -> bool {
        match self.pointer.take() {
            Some(hold) => {
                scheduler.cancel(hold.timer);
                true
            }
            None => false,
        }
    }

    /// Note to re-strike for a fired repeat timer. Stale timers give `None`.
    pub fn repeat_fired(&self, timer: TimerId) -> Option<&str> {
        self.pointer
            .as_ref()
            .filter(|hold| hold.timer == timer)
            .map(|hold| hold.note.as_str())
    }

    /// Notes currently held down by keys or the pointer
    pub fn active_notes(&self) -> BTreeSet<&str> {
        self.held_keys
            .values()
            .copied()
            .chain(self.pointer.as_ref().map(|hold| hold.note.as_str()))
            .collect()
    }

    /// Key binding listing, lowest string first
    pub fn bindings(&self) -> &'static [(char, &'static str)] {
        &KEY_BINDINGS
    }
}

impl Default for InputDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
