//! Single-threaded timer wheel on a virtual clock.
//!
//! All effects in a session run on one logical thread: the host advances the
//! clock and the scheduler hands back due events one at a time, in due-time
//! order, ties broken by scheduling order. Handlers may schedule further
//! timers while draining; those fire in the same pass if they fall due
//! inside the window.
//!
//! Every scheduled event yields a [`TimerHandle`]. Cancelling a handle that
//! already fired or was cancelled is a no-op.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug)]
pub struct Scheduler<E> {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), E>,
    due_by_seq: HashMap<u64, Duration>,
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BTreeMap::new(),
            due_by_seq: HashMap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, event: E) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due = self.now.saturating_add(delay);
        self.queue.insert((due, seq), event);
        self.due_by_seq.insert(seq, due);
        TimerHandle(seq)
    }

    /// Removes a pending timer. Returns the event if it had not fired yet.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<E> {
        let due = self.due_by_seq.remove(&handle.0)?;
        self.queue.remove(&(due, handle.0))
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.due_by_seq.contains_key(&handle.0)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Pops the earliest timer due at or before `until`, moving the clock to
    /// its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerHandle, E)> {
        let (&(due, seq), _) = self.queue.first_key_value()?;
        if due > until {
            return None;
        }
        let event = self.queue.remove(&(due, seq))?;
        self.due_by_seq.remove(&seq);
        self.now = self.now.max(due);
        Some((TimerHandle(seq), event))
    }

    /// Moves the clock forward without firing anything. Callers drain with
    /// [`Scheduler::pop_due`] first.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}
