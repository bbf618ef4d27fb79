//! Strict FIFO for statistics animations.
//!
//! Only one task animates at a time. A task submitted while another is in
//! flight, or while the queue waits out the gap between two tasks, is
//! appended. Tasks are never dropped, reordered or overlapped.

use std::collections::VecDeque;
use std::time::Duration;

use crate::ir::StatsSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationTask {
    pub stats: StatsSnapshot,
    pub operation: Option<String>,
}

impl AnimationTask {
    pub fn new(stats: StatsSnapshot, operation: Option<&str>) -> Self {
        Self {
            stats,
            operation: operation.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    /// The task became the in-flight task.
    Started,
    /// The task waits behind `ahead` others.
    Queued { ahead: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTimer {
    /// The in-flight task finished animating.
    Finished,
    /// The gap after a finished task elapsed; the next task may start.
    StartNext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Animating,
    Gap,
}

#[derive(Debug)]
pub struct AnimationQueue<T> {
    waiting: VecDeque<T>,
    in_flight: Option<T>,
    phase: Phase,
    inter_step_delay: Duration,
    completed: usize,
}

impl<T> AnimationQueue<T> {
    pub fn new(inter_step_delay: Duration) -> Self {
        Self {
            waiting: VecDeque::new(),
            in_flight: None,
            phase: Phase::Idle,
            inter_step_delay,
            completed: 0,
        }
    }

    pub fn submit(&mut self, task: T) -> Submitted {
        if self.phase == Phase::Idle {
            self.in_flight = Some(task);
            self.phase = Phase::Animating;
            tracing::trace!("animation started immediately");
            return Submitted::Started;
        }
        let ahead = self.waiting.len() + usize::from(self.phase == Phase::Animating);
        self.waiting.push_back(task);
        tracing::trace!(ahead, "animation queued");
        Submitted::Queued { ahead }
    }

    pub fn in_flight(&self) -> Option<&T> {
        self.in_flight.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Marks the in-flight task done. When more work waits, returns the gap
    /// to wait before calling [`AnimationQueue::start_next`].
    pub fn finish(&mut self) -> Option<Duration> {
        if self.phase != Phase::Animating {
            return None;
        }
        self.in_flight = None;
        self.completed += 1;
        if self.waiting.is_empty() {
            self.phase = Phase::Idle;
            None
        } else {
            self.phase = Phase::Gap;
            Some(self.inter_step_delay)
        }
    }

    /// Promotes the head of the queue to in-flight once the gap has elapsed.
    pub fn start_next(&mut self) -> Option<&T> {
        if self.phase != Phase::Gap {
            return None;
        }
        match self.waiting.pop_front() {
            Some(task) => {
                self.phase = Phase::Animating;
                self.in_flight = Some(task);
                self.in_flight.as_ref()
            }
            None => {
                self.phase = Phase::Idle;
                None
            }
        }
    }
}
