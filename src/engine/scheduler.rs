//! Virtual clock with a queue of delayed entries.
//!
//! Every delayed mutation of a game (animation steps, display delays, bot
//! thinking time) goes through here, so a harness can fast-forward time
//! deterministically instead of waiting on wall-clock timers.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct Entry<E> {
    at: u64,
    seq: u64,
    item: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    // Reversed: BinaryHeap is a max-heap and we want the earliest entry on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other.at.cmp(&self.at).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Entries due at the same instant come out in scheduling order.
pub struct Scheduler<E> {
    now: u64,
    seq: u64,
    queue: BinaryHeap<Entry<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Scheduler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .finish()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: 0,
            seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Move the clock forward. Never moves it backwards.
    pub fn set_now(&mut self, t: u64) {
        self.now = self.now.max(t);
    }

    pub fn schedule(&mut self, delay_ms: u64, item: E) {
        let entry = Entry {
            at: self.now + delay_ms,
            seq: self.seq,
            item,
        };
        self.seq += 1;
        self.queue.push(entry);
    }

    /// Fire time of the earliest entry.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|e| e.at)
    }

    /// Pop the earliest entry if it is due at or before `until`, advancing
    /// the clock to its fire time.
    pub fn pop_due(&mut self, until: u64) -> Option<E> {
        if self.next_due()? > until {
            return None;
        }
        let entry = self.queue.pop()?;
        self.set_now(entry.at);
        Some(entry.item)
    }

    pub fn any(&self, pred: impl Fn(&E) -> bool) -> bool {
        self.queue.iter().any(|e| pred(&e.item))
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
