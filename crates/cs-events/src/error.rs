use cs_core::Tick;
use cs_pool::PoolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event kind must not be empty")]
    EmptyKind,

    /// Only ticks strictly after the current clock can be scheduled.
    #[error("cannot schedule at {at}: clock is already at {now}")]
    InPast { at: Tick, now: Tick },

    #[error("event controller is already running")]
    AlreadyRunning,

    #[error("event manager configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

pub type EventResult<T> = Result<T, EventError>;
