use std::fmt;

use thiserror::Error;

/// Why an item could not be enqueued.  The rejected item is handed back.
#[derive(Error)]
pub enum QueueError<T> {
    #[error("queue is full")]
    Full(T),

    #[error("queue is closed")]
    Closed(T),
}

impl<T> QueueError<T> {
    /// Recover the item that was not enqueued.
    pub fn into_inner(self) -> T {
        match self {
            QueueError::Full(item) | QueueError::Closed(item) => item,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, QueueError::Closed(_))
    }
}

// Manual impl so `T` need not be `Debug` (task closures are not).
impl<T> fmt::Debug for QueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Full(_) => f.write_str("Full(..)"),
            QueueError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

/// Why no item was dequeued.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DequeueError {
    #[error("queue is empty")]
    Empty,

    /// The queue was closed and every remaining item has been handed out.
    #[error("queue is closed and drained")]
    Closed,
}
