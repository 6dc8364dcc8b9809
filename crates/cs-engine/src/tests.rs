//! Unit tests for cs-engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cs_core::Tick;
use cs_pool::TaskStatus;

use crate::{
    ActivityKind, ActivitySpec, Engine, EngineBuilder, EngineConfig, EngineError, EngineObserver,
    SimMode, Slice,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn scan_engine(workers: usize, last_tick: u64) -> Engine {
    EngineBuilder::new(EngineConfig::new(workers, SimMode::ActivityScan))
        .until(move |tick: Tick| tick >= Tick(last_tick))
        .build()
        .unwrap()
}

type Log = Arc<Mutex<Vec<(ActivityKind, Tick)>>>;

/// Bind a single-item activity that appends `(kind, tick)` to `log`.
fn bind_logger(engine: &mut Engine, kind: ActivityKind, period: u64, log: &Log) {
    engine
        .bind_activity(
            ActivitySpec::new(format!("{kind:?}"), kind, period, 1),
            Arc::clone(log),
            move |log: &Mutex<Vec<(ActivityKind, Tick)>>, _: &Slice, tick: Tick| {
                log.lock().unwrap().push((kind, tick));
                TaskStatus::Success
            },
        )
        .unwrap();
}

#[derive(Default)]
struct Recorder {
    starts: Vec<Tick>,
    ends:   Vec<(Tick, usize)>,
    last:   Option<Tick>,
}

impl EngineObserver for Recorder {
    fn on_tick_start(&mut self, tick: Tick) {
        self.starts.push(tick);
    }
    fn on_tick_end(&mut self, tick: Tick, tasks_run: usize) {
        self.ends.push((tick, tasks_run));
    }
    fn on_sim_end(&mut self, final_tick: Tick) {
        self.last = Some(final_tick);
    }
}

// ── Config and builder ────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use std::sync::Arc;

    use cs_events::EventManager;
    use cs_timer::Timer;

    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.workers, 10);
        assert_eq!(config.mode, SimMode::ActivityScan);
    }

    #[test]
    fn zero_workers_rejected() {
        let err = EngineBuilder::new(EngineConfig::new(0, SimMode::ActivityScan))
            .until(|_: Tick| true)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn activity_scan_needs_predicate() {
        let err = EngineBuilder::new(EngineConfig::default()).build().err().unwrap();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn event_driven_needs_event_manager() {
        let err = EngineBuilder::new(EngineConfig::new(2, SimMode::EventDriven))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn event_manager_must_share_the_timer() {
        let evm_timer = Arc::new(Timer::new("evm", 2));
        let evm = Arc::new(EventManager::<u32>::new(1, evm_timer).unwrap());
        let err = EngineBuilder::new(EngineConfig::new(2, SimMode::EventDriven))
            .timer(Arc::new(Timer::new("other", 2)))
            .events(evm)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn timer_taken_from_event_manager() {
        let timer = Arc::new(Timer::new("shared", 2));
        let evm = Arc::new(EventManager::<u32>::new(1, Arc::clone(&timer)).unwrap());
        let engine = EngineBuilder::new(EngineConfig::new(2, SimMode::EventDriven))
            .events(evm)
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(engine.timer(), &timer));
    }

    #[test]
    fn zero_period_rejected() {
        let mut engine = scan_engine(2, 3);
        let err = engine
            .bind_activity(
                ActivitySpec::new("never", ActivityKind::User, 0, 4),
                Arc::new(()),
                |_: &(), _: &Slice, _: Tick| TaskStatus::Success,
            )
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Config(_)));
        assert_eq!(engine.activity_count(), 0);
    }

    #[test]
    fn nothing_to_run() {
        let mut engine = scan_engine(2, 3);
        assert!(matches!(engine.run(), Err(EngineError::NothingToRun)));
    }
}

// ── Activity scan ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod activity_scan {
    use super::*;

    #[test]
    fn partition_twenty_items_five_workers_period_two() {
        const ITEMS: usize = 20;
        const UNSET: usize = usize::MAX;

        struct Items {
            owner:  Vec<AtomicUsize>,
            visits: Vec<AtomicUsize>,
            ticks:  Mutex<Vec<Tick>>,
        }

        let data = Arc::new(Items {
            owner:  (0..ITEMS).map(|_| AtomicUsize::new(UNSET)).collect(),
            visits: (0..ITEMS).map(|_| AtomicUsize::new(0)).collect(),
            ticks:  Mutex::new(Vec::new()),
        });

        let mut engine = scan_engine(5, 5);
        engine
            .bind_activity(
                ActivitySpec::new("mark", ActivityKind::User, 2, ITEMS),
                Arc::clone(&data),
                |items: &Items, slice: &Slice, tick: Tick| {
                    if slice.index == 0 {
                        items.ticks.lock().unwrap().push(tick);
                    }
                    for i in slice.range.clone() {
                        let prev = items.owner[i].swap(slice.index, Ordering::SeqCst);
                        if prev != UNSET && prev != slice.index {
                            return TaskStatus::Error;
                        }
                        items.visits[i].fetch_add(1, Ordering::SeqCst);
                    }
                    TaskStatus::Success
                },
            )
            .unwrap();

        let final_tick = engine.run().unwrap();

        assert_eq!(final_tick, Tick(6));
        assert_eq!(*data.ticks.lock().unwrap(), vec![Tick(1), Tick(3), Tick(5)]);
        for i in 0..ITEMS {
            assert_eq!(data.owner[i].load(Ordering::SeqCst), i / 4, "item {i}");
            assert_eq!(data.visits[i].load(Ordering::SeqCst), 3, "item {i}");
        }
        assert!(!engine.is_running());
    }

    #[test]
    fn remainder_folds_into_last_slice() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut engine = scan_engine(5, 1);
        engine
            .bind_activity(
                ActivitySpec::new("odd", ActivityKind::User, 1, 21),
                Arc::clone(&seen),
                |seen: &Mutex<Vec<Slice>>, slice: &Slice, _: Tick| {
                    seen.lock().unwrap().push(slice.clone());
                    TaskStatus::Success
                },
            )
            .unwrap();
        engine.run().unwrap();

        let mut slices = seen.lock().unwrap().clone();
        slices.sort_by_key(|s| s.index);
        let ranges: Vec<_> = slices.iter().map(|s| s.range.clone()).collect();
        assert_eq!(ranges, vec![0..4, 4..8, 8..12, 12..16, 16..21]);
        assert!(slices.iter().all(|s| s.total == 5));
    }

    #[test]
    fn fewer_items_than_workers() {
        let tasks = Arc::new(AtomicUsize::new(0));
        let mut engine = scan_engine(5, 1);
        engine
            .bind_activity(
                ActivitySpec::new("tiny", ActivityKind::User, 1, 3),
                Arc::clone(&tasks),
                |tasks: &AtomicUsize, slice: &Slice, _: Tick| {
                    assert_eq!(slice.range.len(), 1);
                    tasks.fetch_add(1, Ordering::SeqCst);
                    TaskStatus::Success
                },
            )
            .unwrap();
        engine.run().unwrap();
        assert_eq!(tasks.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn phase_order_within_a_tick() {
        let log: Log = Arc::default();
        let mut engine = scan_engine(2, 3);
        bind_logger(&mut engine, ActivityKind::AfterStep, 1, &log);
        bind_logger(&mut engine, ActivityKind::User, 1, &log);

        assert_eq!(engine.run().unwrap(), Tick(4));
        use ActivityKind::{AfterStep, User};
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                (User, Tick(1)), (AfterStep, Tick(1)),
                (User, Tick(2)), (AfterStep, Tick(2)),
                (User, Tick(3)), (AfterStep, Tick(3)),
            ]
        );
    }

    #[test]
    fn failing_slices_do_not_stop_the_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut engine = scan_engine(2, 2);
        engine
            .bind_activity(
                ActivitySpec::new("flaky", ActivityKind::User, 1, 4),
                Arc::clone(&calls),
                |calls: &AtomicUsize, _: &Slice, _: Tick| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    TaskStatus::Error
                },
            )
            .unwrap();
        assert_eq!(engine.run().unwrap(), Tick(3));
        assert_eq!(calls.load(Ordering::SeqCst), 4, "2 slices x ticks 1 and 2");
    }

    #[test]
    fn observer_sees_every_tick() {
        let log: Log = Arc::default();
        let mut engine = scan_engine(2, 2);
        bind_logger(&mut engine, ActivityKind::User, 1, &log);

        let mut recorder = Recorder::default();
        let final_tick = engine.start(&mut recorder).unwrap();
        assert_eq!(final_tick, Tick(3));
        assert_eq!(recorder.starts, vec![Tick(1), Tick(2)]);
        assert_eq!(recorder.ends, vec![(Tick(1), 1), (Tick(2), 1)]);
        assert_eq!(recorder.last, Some(Tick(3)));
    }

    #[test]
    fn engine_runs_once() {
        let log: Log = Arc::default();
        let mut engine = scan_engine(1, 1);
        bind_logger(&mut engine, ActivityKind::User, 1, &log);
        engine.run().unwrap();
        assert!(matches!(engine.run(), Err(EngineError::Finished)));
        engine.shutdown();
        engine.shutdown();
    }
}

// ── With an event manager ─────────────────────────────────────────────────────

#[cfg(test)]
mod with_events {
    use cs_events::{Event, EventCore, EventManager, HandlerStatus};
    use cs_timer::Timer;

    use super::*;

    fn event_manager() -> Arc<EventManager<u32>> {
        let timer = Arc::new(Timer::new("clock", 2));
        Arc::new(EventManager::new(3, timer).unwrap())
    }

    #[test]
    fn event_driven_runs_until_calendar_drains() {
        let evm = event_manager();
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        evm.install_handler("hop", move |e: &Event<u32>, core: &EventCore<u32>| {
            let now = core.clock();
            sink.lock().unwrap().push(now);
            if e.payload > 0 && core.schedule(Event::new("hop", e.payload - 1), now + 2).is_err() {
                return HandlerStatus::Error;
            }
            HandlerStatus::Normal
        })
        .unwrap();
        evm.schedule(Event::new("hop", 2), Tick(1)).unwrap();

        let mut engine = EngineBuilder::new(EngineConfig::new(2, SimMode::EventDriven))
            .events(evm.clone())
            .build()
            .unwrap();
        let final_tick = engine.run().unwrap();
        engine.shutdown();

        assert_eq!(*fired.lock().unwrap(), vec![Tick(1), Tick(3), Tick(5)]);
        assert_eq!(final_tick, Tick(6));
        assert!(!evm.has_pending());
        assert!(!evm.is_running());
    }

    #[test]
    fn event_driven_with_empty_calendar_stops_after_one_tick() {
        let evm = event_manager();
        let mut engine = EngineBuilder::new(EngineConfig::new(1, SimMode::EventDriven))
            .events(evm)
            .build()
            .unwrap();
        assert_eq!(engine.run().unwrap(), Tick(1));
    }

    #[test]
    fn activity_scan_interleaves_events() {
        let evm = event_manager();
        let handled = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&handled);
        evm.install_handler("ping", move |_: &Event<u32>, core: &EventCore<u32>| {
            sink.lock().unwrap().push(core.clock());
            HandlerStatus::Normal
        })
        .unwrap();
        evm.schedule(Event::new("ping", 0), Tick(2)).unwrap();
        evm.schedule(Event::new("ping", 0), Tick(2)).unwrap();

        let log: Log = Arc::default();
        let mut engine = EngineBuilder::new(EngineConfig::new(2, SimMode::ActivityScan))
            .events(evm.clone())
            .until(|tick: Tick| tick >= Tick(3))
            .build()
            .unwrap();
        bind_logger(&mut engine, ActivityKind::User, 1, &log);

        assert_eq!(engine.run().unwrap(), Tick(4));
        engine.shutdown();

        assert_eq!(*handled.lock().unwrap(), vec![Tick(2), Tick(2)]);
        let ticks: Vec<Tick> = log.lock().unwrap().iter().map(|(_, t)| *t).collect();
        assert_eq!(ticks, vec![Tick(1), Tick(2), Tick(3)]);
    }
}
