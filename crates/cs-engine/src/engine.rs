//! `Engine` — the simulation main loop.

use std::sync::Arc;

use cs_core::{TaskId, Tick};
use cs_events::EventDriver;
use cs_pool::{PoolStatus, TaskOutput, WorkerPool};
use cs_timer::Timer;
use tracing::{debug, info, warn};

use crate::activity::Activity;
use crate::builder::Termination;
use crate::{
    ActivityFn, ActivityKind, ActivitySpec, EngineConfig, EngineError, EngineObserver,
    EngineResult, NoopObserver, SimMode,
};

/// Drives activities and (optionally) an event manager on one barrier clock.
///
/// Build with [`EngineBuilder`][crate::EngineBuilder], bind activities, then
/// call [`start`][Self::start] or [`run`][Self::run].
pub struct Engine {
    config:      EngineConfig,
    timer:       Arc<Timer>,
    pool:        WorkerPool<()>,
    events:      Option<Arc<dyn EventDriver>>,
    termination: Option<Box<dyn Termination>>,
    activities:  Vec<Activity>,
    running:     bool,
}

impl Engine {
    pub(crate) fn from_parts(
        config:      EngineConfig,
        timer:       Arc<Timer>,
        pool:        WorkerPool<()>,
        events:      Option<Arc<dyn EventDriver>>,
        termination: Option<Box<dyn Termination>>,
    ) -> Self {
        Self { config, timer, pool, events, termination, activities: Vec::new(), running: false }
    }

    /// Register an activity over `data`.
    ///
    /// The item range `0..spec.items` is split into at most `workers`
    /// contiguous slices (remainder in the last); each due run enqueues one
    /// task per slice.
    pub fn bind_activity<D, F>(&mut self, spec: ActivitySpec, data: Arc<D>, func: F) -> EngineResult<()>
    where
        D: Send + Sync + 'static,
        F: ActivityFn<D>,
    {
        if self.running {
            return Err(EngineError::Config("cannot bind activities while running".into()));
        }
        if spec.period_ticks == 0 {
            return Err(EngineError::Config(format!("activity `{}`: period must be > 0", spec.name)));
        }
        let activity = Activity::bind(spec, data, func, self.config.workers);
        debug!(activity = %activity.spec.name, kind = ?activity.spec.kind,
               period = activity.spec.period_ticks, slices = activity.slices.len(), "activity bound");
        self.activities.push(activity);
        Ok(())
    }

    /// [`start`][Self::start] without an observer.
    pub fn run(&mut self) -> EngineResult<Tick> {
        self.start(&mut NoopObserver)
    }

    /// Run the main loop until the stop condition holds.  Returns the final
    /// clock value.
    ///
    /// The timer is stopped on exit, so an engine runs once.
    pub fn start(&mut self, observer: &mut impl EngineObserver) -> EngineResult<Tick> {
        if self.activities.is_empty() && self.events.is_none() {
            return Err(EngineError::NothingToRun);
        }
        if self.timer.is_stopped() {
            return Err(EngineError::Finished);
        }

        self.timer.set_participants(1 + usize::from(self.events.is_some()));
        if let Some(events) = &self.events {
            if !events.is_running() {
                info!(clock = %self.timer.clock(), "starting event controller");
                events.start(Tick(1))?;
            }
        }
        if !self.activities.is_empty() && self.pool.pool_status() == PoolStatus::Ready {
            if let Err(err) = self.pool.start() {
                self.stop_actors();
                return Err(err.into());
            }
        }

        self.running = true;
        info!(mode = ?self.config.mode, activities = self.activities.len(),
              events = self.events.is_some(), "simulation started");
        let result = self.main_loop(observer);
        self.running = false;
        if result.is_err() {
            self.stop_actors();
        }
        result
    }

    fn main_loop(&mut self, observer: &mut impl EngineObserver) -> EngineResult<Tick> {
        let mut now = self.timer.clock();
        loop {
            let mut tasks_run = self.run_due(ActivityKind::AfterStep, now)?;

            let stop = self.should_stop(now);

            debug!(clock = %now, "syncing");
            let next = self.timer.sync()?;

            if stop {
                self.stop_actors();
                info!(clock = %next, "simulation ended");
                observer.on_sim_end(next);
                return Ok(next);
            }

            observer.on_tick_start(next);
            if self.config.mode == SimMode::ActivityScan {
                tasks_run += self.run_due(ActivityKind::User, next)?;
            }
            if let Some(events) = &self.events {
                if !events.wait_tick(next) {
                    debug!(clock = %next, "event controller no longer running");
                }
            }
            observer.on_tick_end(next, tasks_run);
            now = next;
        }
    }

    fn should_stop(&mut self, now: Tick) -> bool {
        match self.config.mode {
            SimMode::ActivityScan => {
                self.termination.as_mut().is_some_and(|t| t.should_stop(now))
            }
            SimMode::EventDriven => self
                .events
                .as_ref()
                .is_some_and(|ev| !ev.has_pending() && ev.is_idle()),
        }
    }

    /// Run every activity of `kind` due at `tick`; wait for all their slice
    /// tasks.  Returns the number of tasks run.
    fn run_due(&mut self, kind: ActivityKind, tick: Tick) -> EngineResult<usize> {
        if tick == Tick::ZERO {
            return Ok(0);
        }
        let pool = &self.pool;
        let mut pending: Vec<(usize, TaskId)> = Vec::new();
        for (index, activity) in self.activities.iter_mut().enumerate() {
            if activity.spec.kind != kind || !activity.is_due(tick) {
                continue;
            }
            activity.last_run = Some(tick);
            debug!(activity = %activity.spec.name, tick = %tick, slices = activity.slices.len(),
                   "scheduling activity");
            for slice in &activity.slices {
                let runner = Arc::clone(&activity.runner);
                let slice = slice.clone();
                let id = pool.submit(move || TaskOutput::from(runner.run_slice(&slice, tick)))?;
                pending.push((index, id));
            }
        }

        let count = pending.len();
        for (index, id) in pending {
            let output = pool.pop_result(id)?;
            if !output.is_success() {
                warn!(activity = %self.activities[index].spec.name, tick = %tick, task = %id,
                      "activity slice failed");
            }
        }
        Ok(count)
    }

    fn stop_actors(&self) {
        if let Some(events) = &self.events {
            events.request_stop();
        }
        self.timer.stop();
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn clock(&self) -> Tick {
        self.timer.clock()
    }

    pub fn timer(&self) -> &Arc<Timer> {
        &self.timer
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    /// Whether the main loop is executing.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Join the activity pool and shut down the attached event manager.
    /// Idempotent; also run on drop.
    pub fn shutdown(&self) {
        self.pool.shutdown();
        if let Some(events) = &self.events {
            events.shutdown();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
