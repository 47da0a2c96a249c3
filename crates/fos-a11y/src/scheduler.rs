//! Timer queue
//!
//! Virtual clock over the single event loop. Hosts feed the current time in
//! and receive the tasks that fell due, in due order; ties fire in
//! scheduling order.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;

use fos_dom::NodeId;

use crate::speech::UtteranceId;

/// Handle to cancel a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deferred work of the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Hand a held utterance to the engine after the settle delay
    DeliverUtterance(UtteranceId),
    /// Look for an overlay the activation opened
    DetectOverlay { before: Vec<NodeId> },
    /// Polling fallback for overlay state
    PollOverlay,
    /// Read the active slide of a carousel
    ReadSlide { slider: NodeId },
    RestartRecognition,
}

#[derive(Debug)]
struct Entry {
    due: Duration,
    id: TimerId,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.id).cmp(&(other.due, other.id))
    }
}

/// Deterministic timer queue
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: u64,
    queue: BinaryHeap<Reverse<Entry>>,
    cancelled: HashSet<TimerId>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Run `task` once `delay` has elapsed
    pub fn schedule(&mut self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        tracing::trace!("Scheduling {:?} in {:?}", task, delay);
        self.queue.push(Reverse(Entry { due: self.now + delay, id, task }));
        id
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.cancelled.insert(id);
    }

    /// Drop every pending task matching `pred`
    pub fn cancel_where(&mut self, pred: impl Fn(&Task) -> bool) {
        for Reverse(entry) in self.queue.iter() {
            if pred(&entry.task) {
                self.cancelled.insert(entry.id);
            }
        }
    }

    /// A live task matching `pred` is pending
    pub fn is_pending(&self, pred: impl Fn(&Task) -> bool) -> bool {
        self.queue
            .iter()
            .any(|Reverse(e)| !self.cancelled.contains(&e.id) && pred(&e.task))
    }

    /// Due time of the earliest live task
    pub fn next_due(&self) -> Option<Duration> {
        self.queue
            .iter()
            .filter(|Reverse(e)| !self.cancelled.contains(&e.id))
            .map(|Reverse(e)| e.due)
            .min()
    }

    /// Pop the next task due at or before `until`, advancing the clock to it
    pub fn pop_due(&mut self, until: Duration) -> Option<Task> {
        loop {
            let due = self.queue.peek().map(|Reverse(e)| e.due)?;
            if due > until {
                self.now = self.now.max(until);
                return None;
            }
            let Reverse(entry) = self.queue.pop()?;
            if self.cancelled.remove(&entry.id) {
                continue;
            }
            self.now = self.now.max(entry.due);
            return Some(entry.task);
        }
    }

    /// Move the clock without running anything
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}
