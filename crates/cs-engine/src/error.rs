use cs_events::EventError;
use cs_pool::PoolError;
use cs_timer::TimerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine configuration error: {0}")]
    Config(String),

    #[error("nothing to run: bind an activity or attach an event manager")]
    NothingToRun,

    #[error("the engine's timer is stopped; the simulation already ran")]
    Finished,

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Events(#[from] EventError),
}

pub type EngineResult<T> = Result<T, EngineError>;
