//! `cs-engine` — the simulation driver.
//!
//! # Main loop
//!
//! ```text
//! now = T0
//! loop:
//!   ① AFTER_STEP — due activities at `now`, one pool task per slice, wait all
//!   ② Terminate? — ACTIVITY_SCAN: predicate(now)
//!                  EVENT_DRIVEN:  no pending events and controller idle
//!   ③ Sync       — timer.sync() with the event controller, now → next
//!   ④ Stop       — if ② said so: stop the controller, stop the timer, exit
//!   ⑤ USER       — ACTIVITY_SCAN only: due activities at `next`
//!   ⑥ Events     — wait until the controller has completed `next`
//! ```
//!
//! An activity is due at tick `T` when it has never run, or when
//! `(T - last_run) % period == 0`.  Nothing runs at `T0`.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let mut engine = EngineBuilder::new(EngineConfig::default())
//!     .until(|tick: Tick| tick >= Tick(100))
//!     .build()?;
//! engine.bind_activity(
//!     ActivitySpec::new("relax", ActivityKind::User, 1, cells.len()),
//!     Arc::clone(&cells),
//!     |cells: &Cells, slice: &Slice, _tick: Tick| cells.relax(slice.range.clone()),
//! )?;
//! let last = engine.run()?;
//! ```

pub mod activity;
pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod observer;

#[cfg(test)]
mod tests;

pub use activity::{ActivityFn, ActivityKind, ActivitySpec, Slice};
pub use builder::{EngineBuilder, Termination};
pub use config::{EngineConfig, SimMode};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use observer::{EngineObserver, NoopObserver};
