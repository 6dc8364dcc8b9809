//! `cs-events` — the event manager.
//!
//! # Per-tick dispatch
//!
//! ```text
//! controller (pool task)                      shard tasks (same pool)
//! ─────────────────────                      ───────────────────────
//! loop:
//!   now = timer.sync()        ── exits on stop request or stopped timer
//!   bucket = calendar.pop(now)
//!   split_even(bucket, workers) ───────────▶ handler(event) for each event in shard
//!   wait for every shard      ◀───────────
//!   publish completion(now)   ── wait_completion(now) returns
//! ```
//!
//! Every handler call for tick `T` happens-before the completion of `T` is
//! published.
//!
//! # Crate layout
//!
//! | Module       | Contents                                            |
//! |--------------|-----------------------------------------------------|
//! | [`event`]    | `Event<P>`, `EventKind`                             |
//! | [`handler`]  | `EventHandler<P>`, `HandlerStatus`                  |
//! | [`calendar`] | `Calendar<P>` (tick → bucket)                       |
//! | [`shared`]   | `EventCore<P>`: calendar, handlers, completion      |
//! | [`manager`]  | `EventManager<P>` and the controller loop           |
//! | [`driver`]   | `EventDriver`: what the engine needs from a manager |
//! | [`error`]    | `EventError`, `EventResult`                         |

pub mod calendar;
pub mod driver;
pub mod error;
pub mod event;
pub mod handler;
pub mod manager;
pub mod shared;

#[cfg(test)]
mod tests;

pub use calendar::Calendar;
pub use driver::EventDriver;
pub use error::{EventError, EventResult};
pub use event::{Event, EventKind};
pub use handler::{EventHandler, HandlerStatus};
pub use manager::EventManager;
pub use shared::EventCore;
