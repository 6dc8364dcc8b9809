//! Unit tests for cs-events.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cs_core::Tick;
use cs_timer::Timer;

use crate::{Event, EventCore, EventManager, HandlerStatus};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A manager whose timer also expects the test thread, acting as the engine.
fn manager(workers: usize) -> (Arc<Timer>, EventManager<u32>) {
    let timer = Arc::new(Timer::new("evm-test", 2));
    let evm = EventManager::new(workers, Arc::clone(&timer)).unwrap();
    (timer, evm)
}

fn counting_handler(
    counter: &Arc<AtomicUsize>,
) -> impl Fn(&Event<u32>, &EventCore<u32>) -> HandlerStatus + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move |_: &Event<u32>, _: &EventCore<u32>| {
        counter.fetch_add(1, Ordering::SeqCst);
        HandlerStatus::Normal
    }
}

// ── Calendar ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod calendar {
    use super::*;
    use crate::Calendar;

    #[test]
    fn buckets_keep_insertion_order() {
        let mut cal = Calendar::new();
        cal.push(Tick(3), Event::new("a", 1u32));
        cal.push(Tick(3), Event::new("b", 2));
        cal.push(Tick(7), Event::new("c", 3));

        assert_eq!(cal.len(), 3);
        assert_eq!(cal.tick_count(), 2);
        assert_eq!(cal.events_at(Tick(3)), 2);
        assert_eq!(cal.nearest(), Some(Tick(3)));
        assert_eq!(cal.farthest(), Some(Tick(7)));

        let bucket = cal.pop_bucket(Tick(3)).unwrap();
        let payloads: Vec<u32> = bucket.iter().map(|e| e.payload).collect();
        assert_eq!(payloads, vec![1, 2]);
        assert_eq!(cal.len(), 1);
        assert_eq!(cal.events_at(Tick(3)), 0);
        assert!(cal.pop_bucket(Tick(3)).is_none(), "popped bucket is removed");
    }

    #[test]
    fn delete_and_empty() {
        let mut cal = Calendar::new();
        assert!(cal.is_empty());
        assert_eq!(cal.nearest(), None);
        cal.push(Tick(2), Event::new("x", 0u32));
        cal.push(Tick(2), Event::new("x", 0));
        assert_eq!(cal.delete(Tick(2)), 2);
        assert_eq!(cal.delete(Tick(2)), 0);
        assert!(cal.is_empty());
        assert_eq!(cal.tick_count(), 0);
    }
}

// ── Handlers and direct dispatch ──────────────────────────────────────────────

#[cfg(test)]
mod handlers {
    use super::*;
    use crate::{EventError, EventKind};

    #[test]
    fn empty_kind_rejected() {
        let (_timer, evm) = manager(1);
        let counter = Arc::new(AtomicUsize::new(0));
        assert!(matches!(evm.install_handler("", counting_handler(&counter)), Err(EventError::EmptyKind)));
        assert!(matches!(evm.schedule(Event::new("", 1), Tick(1)), Err(EventError::EmptyKind)));
    }

    #[test]
    fn throw_without_handler() {
        let (_timer, evm) = manager(1);
        assert_eq!(evm.throw_event(&Event::new("ghost", 0)), HandlerStatus::NoHandler);
    }

    #[test]
    fn throw_returns_handler_status() {
        let (_timer, evm) = manager(1);
        evm.install_handler("fail", |_: &Event<u32>, _: &EventCore<u32>| HandlerStatus::Error).unwrap();
        assert_eq!(evm.throw_event(&Event::new("fail", 0)), HandlerStatus::Error);
    }

    #[test]
    fn reinstall_replaces_handler() {
        let (_timer, evm) = manager(1);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        evm.install_handler("tick", counting_handler(&first)).unwrap();
        evm.install_handler("tick", counting_handler(&second)).unwrap();

        evm.throw_event(&Event::new("tick", 0));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        let kind = EventKind::from("tick");
        assert!(evm.remove_handler(&kind));
        assert!(!evm.has_handler(&kind));
        assert_eq!(evm.throw_event(&Event::new("tick", 0)), HandlerStatus::NoHandler);
    }

    #[test]
    fn throw_scheduled_runs_bucket_in_order() {
        let (_timer, evm) = manager(1);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        evm.install_handler("rec", move |e: &Event<u32>, _: &EventCore<u32>| {
            sink.lock().push(e.payload);
            HandlerStatus::Normal
        })
        .unwrap();

        for n in [5, 6, 7] {
            evm.schedule(Event::new("rec", n), Tick(4)).unwrap();
        }
        assert_eq!(evm.throw_scheduled(Tick(4)), 3);
        assert_eq!(evm.throw_scheduled(Tick(4)), 0);
        assert_eq!(*seen.lock(), vec![5, 6, 7]);
        assert!(!evm.has_pending());
    }
}

// ── Scheduling ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scheduling {
    use super::*;
    use crate::EventError;

    #[test]
    fn past_and_present_ticks_rejected() {
        let timer = Arc::new(Timer::new("solo", 1));
        let evm: EventManager<u32> = EventManager::new(1, Arc::clone(&timer)).unwrap();
        assert!(matches!(
            evm.schedule(Event::new("e", 0), Tick::ZERO),
            Err(EventError::InPast { at: Tick(0), now: Tick(0) })
        ));

        timer.sync().unwrap();
        timer.sync().unwrap();
        assert!(matches!(evm.schedule(Event::new("e", 0), Tick(2)), Err(EventError::InPast { .. })));
        assert!(evm.schedule(Event::new("e", 0), Tick(3)).is_ok());
        assert_eq!(evm.pending_events(), 1);
    }

    #[test]
    fn queries_track_calendar() {
        let (_timer, evm) = manager(1);
        evm.schedule(Event::new("e", 1), Tick(5)).unwrap();
        evm.schedule(Event::new("e", 2), Tick(2)).unwrap();
        evm.schedule(Event::new("e", 3), Tick(9)).unwrap();
        assert_eq!(evm.nearest_tick(), Some(Tick(2)));
        assert_eq!(evm.farthest_tick(), Some(Tick(9)));
        assert_eq!(evm.events_at(Tick(5)), 1);
        assert_eq!(evm.pending_events(), 3);
        assert_eq!(evm.delete_events(Tick(5)), 1);
        assert_eq!(evm.pending_events(), 2);
        assert!(evm.has_pending());
    }

    #[test]
    fn zero_workers_rejected() {
        let timer = Arc::new(Timer::new("t", 1));
        assert!(matches!(
            EventManager::<u32>::new(0, timer),
            Err(EventError::Config(_))
        ));
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod controller {
    use super::*;
    use crate::{EventDriver, EventError};

    #[test]
    fn handlers_run_before_tick_completion() {
        let (timer, evm) = manager(2);
        let counter = Arc::new(AtomicUsize::new(0));
        evm.install_handler("a", counting_handler(&counter)).unwrap();
        evm.install_handler("b", counting_handler(&counter)).unwrap();
        evm.schedule(Event::new("a", 0), Tick(1)).unwrap();
        evm.schedule(Event::new("b", 0), Tick(1)).unwrap();

        evm.start_controller(Tick::ZERO).unwrap();
        assert!(evm.is_running());

        assert_eq!(timer.sync(), Ok(Tick(1)));
        assert!(evm.wait_completion(Tick(1)));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!evm.has_pending());
        assert!(evm.is_idle());
    }

    #[test]
    fn large_bucket_is_sharded_and_each_event_runs_once() {
        const EVENTS: usize = 23;
        let (timer, evm) = manager(4);
        let runs: Arc<Vec<AtomicUsize>> = Arc::new((0..EVENTS).map(|_| AtomicUsize::new(0)).collect());
        let sink = Arc::clone(&runs);
        evm.install_handler("hit", move |e: &Event<u32>, _: &EventCore<u32>| {
            sink[e.payload as usize].fetch_add(1, Ordering::SeqCst);
            HandlerStatus::Normal
        })
        .unwrap();
        for i in 0..EVENTS as u32 {
            evm.schedule(Event::new("hit", i), Tick(2)).unwrap();
        }

        evm.start_controller(Tick(1)).unwrap();
        for expected in 1..=2 {
            assert_eq!(timer.sync(), Ok(Tick(expected)));
            assert!(evm.wait_completion(Tick(expected)));
        }
        assert!(runs.iter().all(|r| r.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn handlers_can_schedule_follow_ups() {
        let (timer, evm) = manager(2);
        let fired_at = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired_at);
        evm.install_handler("chain", move |e: &Event<u32>, core: &EventCore<u32>| {
            let now = core.clock();
            sink.lock().push((e.payload, now));
            if e.payload > 0 {
                let next = Event::new("chain", e.payload - 1);
                if core.schedule(next, now + 2).is_err() {
                    return HandlerStatus::Error;
                }
            }
            HandlerStatus::Normal
        })
        .unwrap();
        evm.schedule(Event::new("chain", 2), Tick(1)).unwrap();

        evm.start_controller(Tick(1)).unwrap();
        for t in 1..=5 {
            assert_eq!(timer.sync(), Ok(Tick(t)));
            assert!(evm.wait_completion(Tick(t)));
        }
        assert_eq!(*fired_at.lock(), vec![(2, Tick(1)), (1, Tick(3)), (0, Tick(5))]);
        assert!(!evm.has_pending());
    }

    #[test]
    fn ticks_before_start_are_skipped_but_completed() {
        let (timer, evm) = manager(1);
        let counter = Arc::new(AtomicUsize::new(0));
        evm.install_handler("e", counting_handler(&counter)).unwrap();
        evm.schedule(Event::new("e", 0), Tick(1)).unwrap();
        evm.schedule(Event::new("e", 0), Tick(3)).unwrap();

        evm.start_controller(Tick(3)).unwrap();
        for t in 1..=3 {
            timer.sync().unwrap();
            assert!(evm.wait_completion(Tick(t)));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(evm.events_at(Tick(1)), 1, "skipped bucket stays in the calendar");
    }

    #[test]
    fn second_start_rejected() {
        let (_timer, evm) = manager(1);
        evm.start_controller(Tick(1)).unwrap();
        assert!(matches!(evm.start_controller(Tick(1)), Err(EventError::AlreadyRunning)));
    }

    #[test]
    fn stop_request_observed_at_next_sync() {
        let (timer, evm) = manager(1);
        evm.start_controller(Tick(1)).unwrap();
        timer.sync().unwrap();
        assert!(evm.wait_completion(Tick(1)));

        evm.stop_controller();
        timer.sync().unwrap();
        assert!(!evm.wait_completion(Tick(2)), "controller exits without completing T2");
        assert!(!evm.is_running());
    }

    #[test]
    fn shutdown_releases_blocked_controller() {
        let (timer, evm) = manager(2);
        evm.start_controller(Tick(1)).unwrap();
        // The controller is parked in the rendezvous, waiting for us.
        std::thread::sleep(std::time::Duration::from_millis(30));
        evm.shutdown();
        assert!(!evm.is_running());
        assert!(timer.is_stopped());
        evm.shutdown();
    }

    #[test]
    fn driver_view() {
        let (timer, evm) = manager(1);
        let driver: &dyn EventDriver = &evm;
        assert!(Arc::ptr_eq(driver.timer(), &timer));
        assert!(!driver.is_running());
        assert!(driver.is_idle());
        evm.schedule(Event::new("e", 0), Tick(1)).unwrap();
        assert!(driver.has_pending());
        driver.start(Tick::ZERO).unwrap();
        assert!(driver.is_running());
        driver.shutdown();
        assert!(!driver.is_running());
    }
}
