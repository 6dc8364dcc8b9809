//! `EventCore` — the state shared by the manager, its controller, its shard
//! tasks, and every handler.

use std::sync::Arc;

use cs_core::Tick;
use cs_timer::Timer;
use parking_lot::{Condvar, Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::{Calendar, Event, EventError, EventHandler, EventKind, EventResult, HandlerStatus};

pub(crate) struct ControlState {
    pub(crate) running:        bool,
    pub(crate) stop_requested: bool,
    pub(crate) last_completed: Tick,
}

/// Calendar, handler table, and tick-completion signal.
pub struct EventCore<P> {
    timer:     Arc<Timer>,
    calendar:  Mutex<Calendar<P>>,
    handlers:  RwLock<FxHashMap<EventKind, Arc<dyn EventHandler<P>>>>,
    control:   Mutex<ControlState>,
    completed: Condvar,
}

impl<P: Send + Sync + 'static> EventCore<P> {
    pub(crate) fn new(timer: Arc<Timer>) -> Self {
        Self {
            timer,
            calendar:  Mutex::new(Calendar::new()),
            handlers:  RwLock::new(FxHashMap::default()),
            control:   Mutex::new(ControlState {
                running:        false,
                stop_requested: false,
                last_completed: Tick::ZERO,
            }),
            completed: Condvar::new(),
        }
    }

    // ── Handlers ──────────────────────────────────────────────────────────

    /// Install `handler` for `kind`, replacing any handler already installed.
    pub fn install_handler(
        &self,
        kind: impl Into<EventKind>,
        handler: impl EventHandler<P>,
    ) -> EventResult<()> {
        let kind = kind.into();
        if kind.is_empty() {
            return Err(EventError::EmptyKind);
        }
        let replaced = self.handlers.write().insert(kind.clone(), Arc::new(handler)).is_some();
        debug!(kind = %kind, replaced, "handler installed");
        Ok(())
    }

    /// Remove the handler for `kind`.  Returns whether one was installed.
    pub fn remove_handler(&self, kind: &EventKind) -> bool {
        self.handlers.write().remove(kind).is_some()
    }

    pub fn has_handler(&self, kind: &EventKind) -> bool {
        self.handlers.read().contains_key(kind)
    }

    // ── Scheduling ────────────────────────────────────────────────────────

    /// Add `event` to the bucket for tick `at`.
    ///
    /// `at` must be strictly after the current clock.  The clock is read
    /// under the calendar lock, so an accepted event can never land in a
    /// bucket the controller has already popped.
    pub fn schedule(&self, event: Event<P>, at: Tick) -> EventResult<()> {
        if event.kind.is_empty() {
            return Err(EventError::EmptyKind);
        }
        let mut calendar = self.calendar.lock();
        let now = self.timer.clock();
        if at <= now {
            warn!(kind = %event.kind, at = %at, now = %now, "event scheduled in the past");
            return Err(EventError::InPast { at, now });
        }
        trace!(kind = %event.kind, at = %at, "event scheduled");
        calendar.push(at, event);
        Ok(())
    }

    /// Dispatch `event` on the calling thread, bypassing the calendar.
    pub fn throw_event(&self, event: &Event<P>) -> HandlerStatus {
        let handler = self.handlers.read().get(&event.kind).cloned();
        match handler {
            Some(handler) => handler.handle(event, self),
            None => {
                warn!(kind = %event.kind, "no handler installed");
                HandlerStatus::NoHandler
            }
        }
    }

    /// Pop the bucket for `tick` and dispatch it on the calling thread, in
    /// insertion order.  Returns the number of events raised.
    pub fn throw_scheduled(&self, tick: Tick) -> usize {
        let Some(bucket) = self.calendar.lock().pop_bucket(tick) else {
            return 0;
        };
        for event in &bucket {
            self.throw_event(event);
        }
        bucket.len()
    }

    /// Discard every event scheduled at `tick`.
    pub fn delete_events(&self, tick: Tick) -> usize {
        self.calendar.lock().delete(tick)
    }

    pub(crate) fn pop_bucket(&self, tick: Tick) -> Option<Vec<Event<P>>> {
        self.calendar.lock().pop_bucket(tick)
    }

    // ── Calendar queries ──────────────────────────────────────────────────

    pub fn nearest_tick(&self) -> Option<Tick> {
        self.calendar.lock().nearest()
    }

    pub fn farthest_tick(&self) -> Option<Tick> {
        self.calendar.lock().farthest()
    }

    pub fn events_at(&self, tick: Tick) -> usize {
        self.calendar.lock().events_at(tick)
    }

    pub fn pending_events(&self) -> usize {
        self.calendar.lock().len()
    }

    /// `true` while at least one event is waiting in the calendar.
    pub fn has_pending(&self) -> bool {
        !self.calendar.lock().is_empty()
    }

    // ── Clock and completion ──────────────────────────────────────────────

    pub fn clock(&self) -> Tick {
        self.timer.clock()
    }

    pub fn timer(&self) -> &Arc<Timer> {
        &self.timer
    }

    pub fn is_running(&self) -> bool {
        self.control.lock().running
    }

    /// The last tick whose dispatch has completed.
    pub fn last_completed(&self) -> Tick {
        self.control.lock().last_completed
    }

    /// Block until dispatch for `tick` has completed or the controller is no
    /// longer running.  Returns whether `tick` completed.
    pub fn wait_completion(&self, tick: Tick) -> bool {
        let mut control = self.control.lock();
        self.completed
            .wait_while(&mut control, |c| c.last_completed < tick && c.running);
        control.last_completed >= tick
    }

    // ── Controller bookkeeping ────────────────────────────────────────────

    /// Mark the controller running.  Fails if it already is.
    pub(crate) fn claim_controller(&self) -> EventResult<()> {
        let mut control = self.control.lock();
        if control.running {
            return Err(EventError::AlreadyRunning);
        }
        control.running = true;
        control.stop_requested = false;
        Ok(())
    }

    pub(crate) fn request_stop(&self) {
        self.control.lock().stop_requested = true;
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.control.lock().stop_requested
    }

    pub(crate) fn publish_completion(&self, tick: Tick) {
        let mut control = self.control.lock();
        control.last_completed = tick;
        self.completed.notify_all();
    }

    pub(crate) fn release_controller(&self) {
        let mut control = self.control.lock();
        control.running = false;
        self.completed.notify_all();
    }
}
