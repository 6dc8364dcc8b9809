use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer `{0}` has been stopped")]
    Stopped(String),

    #[error("timer `{0}` has no participants configured")]
    NoParticipants(String),

    /// More callers arrived in one round than the configured participant count.
    #[error("timer `{id}`: arrival {arrived} exceeds {participants} configured participants")]
    Oversubscribed {
        id:           String,
        arrived:      usize,
        participants: usize,
    },
}

pub type TimerResult<T> = Result<T, TimerError>;
