//! `Calendar` — pending events keyed by the tick they fire at.
//!
//! Same shape as a sparse wake queue: a `BTreeMap` of per-tick buckets, so
//! popping the current tick and finding the nearest/farthest scheduled tick
//! are O(log B) in the number of non-empty buckets.  A bucket disappears as
//! soon as it is popped or deleted, so every key maps to a non-empty bucket.

use std::collections::BTreeMap;

use cs_core::Tick;

use crate::Event;

pub struct Calendar<P> {
    buckets: BTreeMap<Tick, Vec<Event<P>>>,
    /// Cached event count across all buckets.
    total:   usize,
}

impl<P> Default for Calendar<P> {
    fn default() -> Self {
        Self { buckets: BTreeMap::new(), total: 0 }
    }
}

impl<P> Calendar<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` to the bucket for `tick`.  Insertion order is kept
    /// within a bucket.
    pub fn push(&mut self, tick: Tick, event: Event<P>) {
        self.buckets.entry(tick).or_default().push(event);
        self.total += 1;
    }

    /// Detach the whole bucket for `tick`.
    pub fn pop_bucket(&mut self, tick: Tick) -> Option<Vec<Event<P>>> {
        let bucket = self.buckets.remove(&tick)?;
        self.total -= bucket.len();
        Some(bucket)
    }

    /// Discard the bucket for `tick`, returning how many events it held.
    pub fn delete(&mut self, tick: Tick) -> usize {
        self.pop_bucket(tick).map_or(0, |b| b.len())
    }

    pub fn nearest(&self) -> Option<Tick> {
        self.buckets.keys().next().copied()
    }

    pub fn farthest(&self) -> Option<Tick> {
        self.buckets.keys().next_back().copied()
    }

    pub fn events_at(&self, tick: Tick) -> usize {
        self.buckets.get(&tick).map_or(0, Vec::len)
    }

    /// Total events across all ticks.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct ticks with at least one event.
    pub fn tick_count(&self) -> usize {
        self.buckets.len()
    }
}
