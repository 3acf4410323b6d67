// Scheduler - Cancellable one-shot and repeating timers on a virtual clock
//
// Single-threaded. Nothing fires by itself: the owner reads its clock, calls
// `poll(now)` and dispatches the returned events. Events are plain data, so a
// pending timer never holds a borrow of application state.
//
// Deadlines are `Duration`s since the clock's origin. Timers with the same
// deadline fire in the order they were scheduled.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Shortest period accepted for repeating timers
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Source of "now" for the scheduler's owner
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Monotonic wall clock, zero at construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Handle of a scheduled timer, valid until it fires (one-shot) or is cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

struct Timer<E> {
    event: E,
    period: Option<Duration>,
}

pub struct Scheduler<E> {
    queue: BTreeMap<(Duration, TimerId), Timer<E>>,
    deadlines: HashMap<TimerId, Duration>,
    next_id: u64,
}

impl<E: Clone> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_id: 0,
        }
    }

    fn insert(&mut self, deadline: Duration, event: E, period: Option<Duration>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.insert((deadline, id), Timer { event, period });
        self.deadlines.insert(id, deadline);
        id
    }

    /// Fire `event` once, `delay` after `now`
    pub fn schedule_once(&mut self, now: Duration, delay: Duration, event: E) -> TimerId {
        self.insert(now.saturating_add(delay), event, None)
    }

    /// Fire `event` every `period`, the first time one period after `now`
    pub fn schedule_repeating(&mut self, now: Duration, period: Duration, event: E) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.insert(now.saturating_add(period), event, Some(period))
    }

    /// Returns false if the timer already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.queue.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Collect every event due at `now`, earliest first.
    ///
    /// A repeating timer fires at most once per poll. It is re-armed one period
    /// after its deadline, or one period after `now` if it has fallen behind.
    pub fn poll(&mut self, now: Duration) -> Vec<(TimerId, E)> {
        let mut due = Vec::new();

        while let Some(entry) = self.queue.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((deadline, id), timer) = entry.remove_entry();

            match timer.period {
                Some(period) => {
                    let mut next = deadline.saturating_add(period);
                    if next <= now {
                        next = now.saturating_add(period);
                    }
                    due.push((id, timer.event.clone()));
                    self.queue.insert((next, id), timer);
                    self.deadlines.insert(id, next);
                }
                None => {
                    self.deadlines.remove(&id);
                    due.push((id, timer.event));
                }
            }
        }

        due
    }
}

impl<E: Clone> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}
