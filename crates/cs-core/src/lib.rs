//! `cs-core` — foundational types for the `rust_cs` simulation runtime.
//!
//! This crate is a dependency of every other `cs-*` crate.  It has no `cs-*`
//! dependencies and a single external one (`parking_lot`, plus optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `TaskId`, `WorkerId`, `IdSequence`                    |
//! | [`time`]        | `Tick`                                                |
//! | [`sync`]        | `Semaphore` (counting)                                |
//! | [`partition`]   | `split_even` — the contiguous near-equal range split  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to `Tick` and the id types. |

pub mod ids;
pub mod partition;
pub mod sync;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use ids::{IdSequence, TaskId, WorkerId};
pub use partition::split_even;
pub use sync::Semaphore;
pub use time::Tick;
