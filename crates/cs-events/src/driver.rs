use std::sync::Arc;

use cs_core::Tick;
use cs_timer::Timer;

use crate::{EventManager, EventResult};

/// The view of an event manager the engine drives, independent of the event
/// payload type.
pub trait EventDriver: Send + Sync {
    /// The barrier clock the controller synchronizes on.
    fn timer(&self) -> &Arc<Timer>;

    /// Start the controller, dispatching from tick `from` on.
    fn start(&self, from: Tick) -> EventResult<()>;

    fn is_running(&self) -> bool;

    /// Cooperative stop, observed at the controller's next sync.
    fn request_stop(&self);

    /// `true` while any event is still scheduled.
    fn has_pending(&self) -> bool;

    /// `true` when no dispatch is in flight: every tick up to the current
    /// clock has completed, or the controller is not running.
    fn is_idle(&self) -> bool;

    /// Block until dispatch for `tick` has completed.
    fn wait_tick(&self, tick: Tick) -> bool;

    fn shutdown(&self);
}

impl<P: Send + Sync + 'static> EventDriver for EventManager<P> {
    fn timer(&self) -> &Arc<Timer> {
        self.core().timer()
    }

    fn start(&self, from: Tick) -> EventResult<()> {
        self.start_controller(from)
    }

    fn is_running(&self) -> bool {
        self.core().is_running()
    }

    fn request_stop(&self) {
        self.stop_controller();
    }

    fn has_pending(&self) -> bool {
        self.core().has_pending()
    }

    fn is_idle(&self) -> bool {
        let core = self.core();
        !core.is_running() || core.last_completed() >= core.clock()
    }

    fn wait_tick(&self, tick: Tick) -> bool {
        self.core().wait_completion(tick)
    }

    fn shutdown(&self) {
        EventManager::shutdown(self);
    }
}
