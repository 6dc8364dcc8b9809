//! Engine observer trait for progress reporting and data collection.

use cs_core::Tick;

/// Callbacks invoked by [`Engine::start`][crate::Engine::start] at key points
/// in the main loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct Progress;
///
/// impl EngineObserver for Progress {
///     fn on_tick_end(&mut self, tick: Tick, tasks_run: usize) {
///         println!("{tick}: {tasks_run} slice tasks");
///     }
/// }
/// ```
pub trait EngineObserver {
    /// Called right after the clock advances to `tick`, before that tick's
    /// USER activities.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called once `tick`'s activities and events have completed.
    ///
    /// `tasks_run` counts slice tasks since the previous call, AFTER_STEP
    /// tasks of the previous tick included.
    fn on_tick_end(&mut self, _tick: Tick, _tasks_run: usize) {}

    /// Called once after the loop exits, with the final clock value.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// An [`EngineObserver`] that does nothing.
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}
