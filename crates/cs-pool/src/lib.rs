//! `cs-pool` — fixed-size worker pool.
//!
//! # Threads
//!
//! ```text
//!   enqueue ──▶ BoundedQueue ──▶ dispatcher ──(free-worker semaphore)──▶ worker[k]
//!                                                                          │
//!   wait / get_result / pop_result ◀──── result table (TaskId → slot) ◀────┘
//! ```
//!
//! * `enqueue` records the task in the result table and then blocks while the
//!   queue is full.  That block is the runtime's only backpressure.
//! * The dispatcher takes one permit per task, so it never assigns to a busy
//!   worker.  Workers are found by a linear scan for the first `Waiting` one.
//! * Every task completes exactly once, including tasks that panic (recorded
//!   as [`TaskStatus::Error`]) and tasks abandoned in the queue at teardown.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`config`] | `PoolConfig`                                               |
//! | [`task`]   | `TaskFn`, `TaskOutput`, `TaskStatus`, `TaskRuntimeStatus`  |
//! | [`worker`] | `WorkerStatus` and the worker thread loop                  |
//! | [`pool`]   | `WorkerPool`, `PoolHandle`, `PoolStatus`                   |
//! | [`error`]  | `PoolError`, `PoolResult`                                  |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let pool = WorkerPool::new(PoolConfig::new("burst", 4))?;
//! pool.start()?;
//! let id = pool.enqueue(|n: u64| TaskOutput::ok(n * 2), 21)?;
//! assert_eq!(pool.pop_result(id)?.output, Some(42));
//! pool.shutdown();
//! ```

pub mod config;
pub mod error;
pub mod pool;
pub mod task;
pub mod worker;


pub use config::PoolConfig;
pub use error::{PoolError, PoolResult};
pub use pool::{PoolHandle, PoolStatus, WorkerPool};
pub use task::{TaskFn, TaskOutput, TaskRuntimeStatus, TaskStatus};
pub use worker::WorkerStatus;
