//! `BoundedQueue` — the capacity-limited FIFO.
//!
//! One mutex guards the item list and the closed flag.  Two condition
//! variables stand in for the "free slots" and "items available" counters:
//! a producer sleeps on `not_full` while `len == capacity`, a consumer on
//! `not_empty` while `len == 0`.  Both counters are derived from the list
//! itself, so they can never drift out of step with it.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::{DequeueError, QueueError};

/// Hook invoked on every item still queued when the queue is dropped.
pub trait Reclaim<T>: Send + Sync {
    fn reclaim(&self, item: T);
}

impl<T, F> Reclaim<T> for F
where
    F: Fn(T) + Send + Sync,
{
    fn reclaim(&self, item: T) {
        self(item)
    }
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A thread-safe FIFO holding at most `capacity` items.
pub struct BoundedQueue<T> {
    name: String,
    capacity: usize,
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    reclaim: Option<Box<dyn Reclaim<T>>>,
}

impl<T> BoundedQueue<T> {
    pub fn new(name: impl Into<String>, capacity: NonZeroUsize) -> Self {
        Self {
            name: name.into(),
            capacity: capacity.get(),
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.get()),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            reclaim: None,
        }
    }

    /// Like [`new`][Self::new], but leftover items are passed to `reclaim`
    /// when the queue is dropped instead of being dropped silently.
    pub fn with_reclaim(
        name: impl Into<String>,
        capacity: NonZeroUsize,
        reclaim: impl Reclaim<T> + 'static,
    ) -> Self {
        let mut queue = Self::new(name, capacity);
        queue.reclaim = Some(Box::new(reclaim));
        queue
    }

    // ── Producers ─────────────────────────────────────────────────────────

    /// Append `item`, blocking while the queue is full.
    ///
    /// Returns `Closed(item)` if the queue is (or becomes, while waiting)
    /// closed.
    pub fn enqueue(&self, item: T) -> Result<(), QueueError<T>> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                debug!(queue = %self.name, "enqueue rejected: queue closed");
                return Err(QueueError::Closed(item));
            }
            if state.items.len() < self.capacity {
                state.items.push_back(item);
                trace!(queue = %self.name, len = state.items.len(), "enqueued");
                self.not_empty.notify_one();
                return Ok(());
            }
            self.not_full.wait(&mut state);
        }
    }

    /// Append `item` without blocking.
    pub fn try_enqueue(&self, item: T) -> Result<(), QueueError<T>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(QueueError::Closed(item));
        }
        if state.items.len() >= self.capacity {
            return Err(QueueError::Full(item));
        }
        state.items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    // ── Consumers ─────────────────────────────────────────────────────────

    /// Remove the oldest item, blocking while the queue is empty and open.
    ///
    /// Items enqueued before `close()` are still handed out; `Closed` is
    /// returned only once the queue is closed *and* empty.
    pub fn dequeue(&self) -> Result<T, DequeueError> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                self.not_full.notify_one();
                return Ok(item);
            }
            if state.closed {
                return Err(DequeueError::Closed);
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Remove the oldest item without blocking.
    pub fn try_dequeue(&self) -> Result<T, DequeueError> {
        let mut state = self.state.lock();
        match state.items.pop_front() {
            Some(item) => {
                self.not_full.notify_one();
                Ok(item)
            }
            None if state.closed => Err(DequeueError::Closed),
            None => Err(DequeueError::Empty),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Stop accepting items and wake every blocked producer and consumer.
    ///
    /// Closing twice is harmless.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            state.closed = true;
            debug!(queue = %self.name, pending = state.items.len(), "queue closed");
        }
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Drop for BoundedQueue<T> {
    fn drop(&mut self) {
        let leftovers = std::mem::take(&mut self.state.get_mut().items);
        if leftovers.is_empty() {
            return;
        }
        debug!(queue = %self.name, count = leftovers.len(), "reclaiming leftover items");
        if let Some(reclaim) = &self.reclaim {
            for item in leftovers {
                reclaim.reclaim(item);
            }
        }
    }
}
