//! Counting semaphore.
//!
//! `std` has no semaphore; the worker pool needs two flavours of one (the
//! shared free-worker counter and each worker's private wake signal), so a
//! small permit counter over `parking_lot::{Mutex, Condvar}` lives here.

use parking_lot::{Condvar, Mutex};

/// A classic counting semaphore.
///
/// `acquire` blocks until a permit is available and takes it; `release`
/// returns one permit and wakes one waiter.
#[derive(Debug)]
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    pub fn new(permits: usize) -> Self {
        Self { permits: Mutex::new(permits), available: Condvar::new() }
    }

    /// Block until a permit is available, then take it.
    pub fn acquire(&self) {
        let mut permits = self.permits.lock();
        self.available.wait_while(&mut permits, |p| *p == 0);
        *permits -= 1;
    }

    /// Take a permit if one is available without blocking.
    pub fn try_acquire(&self) -> bool {
        let mut permits = self.permits.lock();
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Return a permit and wake one blocked `acquire`.
    pub fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.available.notify_one();
    }

    /// Snapshot of the current permit count.
    pub fn available(&self) -> usize {
        *self.permits.lock()
    }
}
