//! Fluent builder for constructing an [`Engine`].

use std::sync::Arc;

use cs_core::Tick;
use cs_events::EventDriver;
use cs_pool::{PoolConfig, WorkerPool};
use cs_timer::Timer;

use crate::{Engine, EngineConfig, EngineError, EngineResult, SimMode};

/// Stop condition for ACTIVITY_SCAN mode, evaluated once per tick.
///
/// Returns `true` when the simulation should stop.  Implemented for
/// `FnMut(Tick) -> bool` closures.
pub trait Termination: Send {
    fn should_stop(&mut self, tick: Tick) -> bool;
}

impl<F> Termination for F
where
    F: FnMut(Tick) -> bool + Send,
{
    fn should_stop(&mut self, tick: Tick) -> bool {
        self(tick)
    }
}

/// Fluent builder for [`Engine`].
///
/// # Inputs
///
/// | Method          | Default                                          |
/// |-----------------|--------------------------------------------------|
/// | `.timer(t)`     | the event manager's timer, else a fresh `Timer`  |
/// | `.events(evm)`  | none (required in `EventDriven` mode)            |
/// | `.until(pred)`  | none (required in `ActivityScan` mode)           |
///
/// # Example
///
/// ```rust,ignore
/// let timer = Arc::new(Timer::new("clock", 2));
/// let evm = Arc::new(EventManager::<Msg>::new(4, Arc::clone(&timer))?);
/// let mut engine = EngineBuilder::new(EngineConfig::new(4, SimMode::EventDriven))
///     .events(evm.clone())
///     .build()?;
/// engine.run()?;
/// ```
pub struct EngineBuilder {
    config:      EngineConfig,
    timer:       Option<Arc<Timer>>,
    events:      Option<Arc<dyn EventDriver>>,
    termination: Option<Box<dyn Termination>>,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, timer: None, events: None, termination: None }
    }

    /// Use `timer` as the simulation clock.
    pub fn timer(mut self, timer: Arc<Timer>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Attach an event manager.  It must synchronize on the engine's timer.
    pub fn events(mut self, events: Arc<dyn EventDriver>) -> Self {
        self.events = Some(events);
        self
    }

    /// Stop once `predicate(tick)` returns `true`.
    pub fn until(mut self, predicate: impl Termination + 'static) -> Self {
        self.termination = Some(Box::new(predicate));
        self
    }

    /// Validate inputs and construct the [`Engine`].
    ///
    /// # Errors
    ///
    /// - `config.workers == 0`.
    /// - `ActivityScan` mode without a termination predicate.
    /// - `EventDriven` mode without an event manager.
    /// - An event manager whose timer is not the engine's timer.
    pub fn build(self) -> EngineResult<Engine> {
        self.config.validate()?;

        match self.config.mode {
            SimMode::ActivityScan if self.termination.is_none() => {
                return Err(EngineError::Config(
                    "ACTIVITY_SCAN mode requires a termination predicate".into(),
                ));
            }
            SimMode::EventDriven if self.events.is_none() => {
                return Err(EngineError::Config(
                    "EVENT_DRIVEN mode requires an event manager".into(),
                ));
            }
            _ => {}
        }

        let timer = match (self.timer, &self.events) {
            (Some(timer), Some(events)) => {
                if !Arc::ptr_eq(&timer, events.timer()) {
                    return Err(EngineError::Config(
                        "event manager synchronizes on a different timer".into(),
                    ));
                }
                timer
            }
            (Some(timer), None) => timer,
            (None, Some(events)) => Arc::clone(events.timer()),
            (None, None) => Arc::new(Timer::new("engine", 1)),
        };

        let pool = WorkerPool::new(PoolConfig::new(
            format!("engine-{}", timer.id()),
            self.config.workers,
        ))?;

        Ok(Engine::from_parts(self.config, timer, pool, self.events, self.termination))
    }
}
