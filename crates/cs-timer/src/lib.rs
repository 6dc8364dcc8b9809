//! `cs-timer` — the barrier clock.
//!
//! A [`Timer`] owns the simulation's logical clock.  Every participant calls
//! [`Timer::sync`] once per round; the clock advances by exactly one tick when
//! the last participant arrives, and every participant leaves the round
//! holding the new value.
//!
//! ```text
//! participants = 2        engine ──sync──┐
//!                                       ├── clock: T3 → T4
//!                     controller ──sync──┘
//! ```
//!
//! `stop()` is terminal: blocked and future callers get
//! [`TimerError::Stopped`] instead of waiting for a round that will never
//! complete.

pub mod error;
pub mod timer;


pub use error::{TimerError, TimerResult};
pub use timer::Timer;
