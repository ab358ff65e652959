use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Generation counter for a batch of scheduled work.
///
/// Every timer is stamped with the epoch that was current when it was armed.
/// Bumping the epoch orphans all of them: they are dropped from the queue and
/// any that slip through are discarded when popped.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Epoch(u64);

impl Epoch {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub epoch: Epoch,
    pub at: Duration,
    pub task: T,
}

#[derive(Debug)]
struct Entry<T> {
    due: Duration,
    seq: u64,
    epoch: Epoch,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // Reversed so the max-heap pops the earliest deadline first; ties fall
    // back to arming order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Virtual-time timer queue.
///
/// The scheduler never reads a wall clock. Callers move time forward with
/// [`Scheduler::pop_due`] / [`Scheduler::advance_to`], which makes the whole
/// timing model deterministic under test while a real-time driver only has to
/// sleep for [`Scheduler::time_until_next`].
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    epoch: Epoch,
    next_seq: u64,
    queue: BinaryHeap<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            epoch: Epoch::default(),
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Arms `task` to fire `delay` after the current virtual time and returns
    /// its deadline.
    pub fn schedule_after(&mut self, delay: Duration, task: T) -> Duration {
        let due = self.now.saturating_add(delay);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.queue.push(Entry {
            due,
            seq,
            epoch: self.epoch,
            task,
        });
        due
    }

    /// Cancels everything pending and starts a new epoch.
    pub fn bump_epoch(&mut self) -> Epoch {
        self.queue.clear();
        self.epoch = self.epoch.next();
        self.epoch
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.peek().map(|entry| entry.due)
    }

    pub fn time_until_next(&self) -> Option<Duration> {
        self.next_deadline().map(|due| due.saturating_sub(self.now))
    }

    /// Pops the earliest task due at or before `until`, moving the clock to
    /// its deadline. Tasks armed under an older epoch are skipped.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<T>> {
        loop {
            let due = self.queue.peek()?.due;
            if due > until {
                return None;
            }
            let entry = self.queue.pop()?;
            if entry.epoch != self.epoch {
                continue;
            }
            self.now = self.now.max(entry.due);
            return Some(Fired {
                epoch: entry.epoch,
                at: entry.due,
                task: entry.task,
            });
        }
    }

    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}
