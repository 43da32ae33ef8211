//! Virtual-time task queue keyed by round generation
//!
//! Tasks fire in due-time order; ties fire in the order they were scheduled.
//! `cancel_all` is O(1): it bumps the generation and stale entries are dropped
//! lazily as they surface, so a callback from a previous round can never fire.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::core::types::{Generation, Millis};

/// A task that came due
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled<T> {
    pub due: Millis,
    pub generation: Generation,
    pub task: T,
}

#[derive(Debug)]
struct Entry<T> {
    due: Millis,
    seq: u64,
    generation: Generation,
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
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

#[derive(Debug)]
pub struct Scheduler<T> {
    queue: BinaryHeap<Reverse<Entry<T>>>,
    generation: Generation,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            generation: Generation::default(),
            next_seq: 0,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Queue `task` to fire at `due` under the current generation
    pub fn schedule_at(&mut self, due: Millis, task: T) {
        let entry = Entry {
            due,
            seq: self.next_seq,
            generation: self.generation,
            task,
        };
        self.next_seq += 1;
        self.queue.push(Reverse(entry));
    }

    /// Pop the earliest live task due at or before `now`
    pub fn pop_due(&mut self, now: Millis) -> Option<Scheduled<T>> {
        loop {
            let head = self.queue.peek()?;
            if head.0.due > now {
                return None;
            }
            let Reverse(entry) = self.queue.pop()?;
            if entry.generation != self.generation {
                continue;
            }
            return Some(Scheduled {
                due: entry.due,
                generation: entry.generation,
                task: entry.task,
            });
        }
    }

    /// Invalidate everything queued so far
    pub fn cancel_all(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    /// Due time of the earliest live task
    pub fn next_due(&mut self) -> Option<Millis> {
        while let Some(head) = self.queue.peek() {
            if head.0.generation == self.generation {
                return Some(head.0.due);
            }
            self.queue.pop();
        }
        None
    }

    /// Live tasks still waiting to fire
    pub fn pending(&self) -> usize {
        self.queue
            .iter()
            .filter(|entry| entry.0.generation == self.generation)
            .count()
    }
}
