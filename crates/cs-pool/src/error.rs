use cs_core::TaskId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool configuration error: {0}")]
    Config(String),

    #[error("pool `{0}` is not started")]
    NotStarted(String),

    #[error("pool `{0}` is already running")]
    AlreadyRunning(String),

    /// The pool began shutting down while the task was being enqueued.
    #[error("pool `{0}` is shutting down")]
    ShutDown(String),

    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    #[error("pool `{pool}`: failed to spawn thread: {source}")]
    Spawn {
        pool:   String,
        #[source]
        source: std::io::Error,
    },
}

pub type PoolResult<T> = Result<T, PoolError>;
