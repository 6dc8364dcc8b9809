//! `cs-queue` — the bounded task queue that feeds every worker pool.
//!
//! # Crate layout
//!
//! | Module     | Contents                                             |
//! |------------|------------------------------------------------------|
//! | [`queue`]  | `BoundedQueue<T>`, `Reclaim<T>`                      |
//! | [`error`]  | `QueueError<T>`, `DequeueError`                      |
//!
//! # Semantics (summary)
//!
//! ```text
//! enqueue(x)      blocks while full; Closed(x) once closed
//! try_enqueue(x)  Full(x) | Closed(x) | Ok
//! dequeue()       blocks while empty and open; Closed once closed *and* drained
//! try_dequeue()   Empty | Closed | Ok
//! close()         wakes every blocked producer and consumer
//! drop            hands leftover items to the Reclaim hook, FIFO order
//! ```

pub mod error;
pub mod queue;


pub use error::{DequeueError, QueueError};
pub use queue::{BoundedQueue, Reclaim};
