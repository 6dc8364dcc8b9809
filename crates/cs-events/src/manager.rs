//! `EventManager` — owns the dispatch pool and runs the controller on it.

use std::ops::{Deref, Range};
use std::sync::Arc;

use cs_core::{Tick, split_even};
use cs_pool::{PoolConfig, PoolHandle, TaskOutput, WorkerPool};
use cs_timer::Timer;
use tracing::{debug, info, warn};

use crate::{Event, EventCore, EventError, EventHandler, EventResult, HandlerStatus};

/// Calendar + handler table + a controller that dispatches each tick's
/// bucket across `workers` shard tasks.
///
/// The internal pool has `workers + 1` threads: one is held by the
/// controller for as long as it runs.  Derefs to [`EventCore`] for
/// scheduling and queries.
pub struct EventManager<P: Send + Sync + 'static> {
    core:    Arc<EventCore<P>>,
    pool:    WorkerPool<()>,
    workers: usize,
}

impl<P: Send + Sync + 'static> EventManager<P> {
    /// Create a manager that synchronizes on `timer`.
    ///
    /// The timer's participant count is left to the caller (the engine sets
    /// it to include the controller).
    pub fn new(workers: usize, timer: Arc<Timer>) -> EventResult<Self> {
        if workers == 0 {
            return Err(EventError::Config("event manager needs at least one worker".into()));
        }
        let pool = WorkerPool::new(PoolConfig::new(format!("evm-{}", timer.id()), workers + 1))?;
        Ok(Self { core: Arc::new(EventCore::new(timer)), pool, workers })
    }

    pub fn core(&self) -> &Arc<EventCore<P>> {
        &self.core
    }

    /// Maximum number of shards one tick's bucket is split into.
    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn install_handler(
        &self,
        kind: impl Into<crate::EventKind>,
        handler: impl EventHandler<P>,
    ) -> EventResult<()> {
        self.core.install_handler(kind, handler)
    }

    // ── Controller ────────────────────────────────────────────────────────

    /// Start the controller.  Ticks before `from` are synced and reported
    /// complete without dispatching; a `from` of `T0` is treated as `T1`.
    pub fn start_controller(&self, from: Tick) -> EventResult<()> {
        let from = if from == Tick::ZERO { Tick(1) } else { from };
        self.core.claim_controller()?;

        let started = self.pool.start().or_else(|err| match err {
            cs_pool::PoolError::AlreadyRunning(_) => Ok(()),
            other => Err(other),
        });
        let submitted = started.and_then(|()| {
            let core = Arc::clone(&self.core);
            let pool = self.pool.handle();
            let shards = self.workers;
            self.pool.submit(move || controller_loop(&core, &pool, shards, from))
        });
        if let Err(err) = submitted {
            self.core.release_controller();
            return Err(err.into());
        }
        info!(timer = %self.core.timer().id(), from = %from, shards = self.workers,
              "event controller started");
        Ok(())
    }

    /// Ask the controller to exit at its next sync boundary.  Dispatch already
    /// in progress for the current tick completes first.
    pub fn stop_controller(&self) {
        self.core.request_stop();
    }

    /// Stop the controller and join the dispatch pool.
    ///
    /// A controller blocked in a rendezvous can only be released by a
    /// completed round or a stopped timer, so a still-running controller
    /// stops the shared timer.  Idempotent.
    pub fn shutdown(&self) {
        self.core.request_stop();
        if self.core.is_running() {
            debug!(timer = %self.core.timer().id(), "stopping timer to release the controller");
            self.core.timer().stop();
        }
        self.pool.shutdown();
    }
}

impl<P: Send + Sync + 'static> Deref for EventManager<P> {
    type Target = EventCore<P>;

    fn deref(&self) -> &EventCore<P> {
        &self.core
    }
}

impl<P: Send + Sync + 'static> Drop for EventManager<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Controller loop ───────────────────────────────────────────────────────────

fn controller_loop<P: Send + Sync + 'static>(
    core: &Arc<EventCore<P>>,
    pool: &PoolHandle<()>,
    shards: usize,
    start: Tick,
) -> TaskOutput<()> {
    let mut failed = false;
    loop {
        let now = match core.timer().sync() {
            Ok(now) => now,
            Err(err) => {
                debug!(error = %err, "controller leaving rendezvous");
                break;
            }
        };
        if core.stop_requested() {
            break;
        }
        if now >= start {
            if let Some(bucket) = core.pop_bucket(now) {
                failed |= !dispatch_bucket(core, pool, shards, now, bucket);
            }
        }
        core.publish_completion(now);
    }
    core.release_controller();
    info!(clock = %core.clock(), "event controller exiting");
    if failed { TaskOutput::failed() } else { TaskOutput::done() }
}

/// Run every handler in `bucket`, split into contiguous shards on the pool.
/// Returns `false` if any handler reported an error.
fn dispatch_bucket<P: Send + Sync + 'static>(
    core: &Arc<EventCore<P>>,
    pool: &PoolHandle<()>,
    shards: usize,
    now: Tick,
    bucket: Vec<Event<P>>,
) -> bool {
    let events = Arc::new(bucket);
    let ranges = split_even(events.len(), shards);
    debug!(tick = %now, events = events.len(), shards = ranges.len(), "dispatching bucket");

    let mut ok = true;
    let mut ids = Vec::with_capacity(ranges.len());
    for range in ranges {
        let core_for_shard = Arc::clone(core);
        let events_for_shard = Arc::clone(&events);
        let shard = range.clone();
        match pool.submit(move || run_shard(&core_for_shard, &events_for_shard, shard)) {
            Ok(id) => ids.push(id),
            Err(err) => {
                // Pool is shutting down: finish this tick on the controller.
                warn!(tick = %now, error = %err, "shard not enqueued; dispatching inline");
                ok &= run_shard(core, &events, range).is_success();
            }
        }
    }
    for id in ids {
        match pool.pop_result(id) {
            Ok(out) => ok &= out.is_success(),
            Err(err) => {
                warn!(tick = %now, error = %err, "lost shard result");
                ok = false;
            }
        }
    }
    ok
}

fn run_shard<P: Send + Sync + 'static>(
    core: &EventCore<P>,
    events: &[Event<P>],
    range: Range<usize>,
) -> TaskOutput<()> {
    let mut ok = true;
    for event in &events[range] {
        match core.throw_event(event) {
            HandlerStatus::Normal => {}
            status => {
                warn!(kind = %event.kind, ?status, "handler did not complete normally");
                ok = false;
            }
        }
    }
    if ok { TaskOutput::done() } else { TaskOutput::failed() }
}
