//! engine-sample — runs the engine in either simulation mode.
//!
//! ```bash
//! # Map/reduce a random data set, one tick per pass
//! engine-sample --mode activity-scan --items 10000 --workers 5
//!
//! # Event chains T0 → T2 or T1 → T3,T4, with a per-tick CSV log
//! engine-sample --mode event-driven --csv ticks.csv
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use cs_core::Tick;
use cs_demo::classify::Classify;
use cs_demo::{CsvTickObserver, ProgressObserver};
use cs_engine::{ActivityKind, ActivitySpec, Engine, EngineBuilder, EngineConfig, SimMode, Slice};
use cs_events::{Event, EventCore, EventManager, HandlerStatus};
use cs_timer::Timer;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    ActivityScan,
    EventDriven,
}

#[derive(Parser, Debug)]
#[command(name = "engine-sample")]
#[command(version, about = "Run the simulation engine on a sample workload", long_about = None)]
struct Args {
    #[arg(short = 'm', long, value_enum, default_value = "activity-scan")]
    mode: Mode,

    /// Engine worker threads (also the event manager's shard count)
    #[arg(short = 'w', long, default_value = "5")]
    workers: usize,

    /// Data set size for the activity-scan run
    #[arg(long, default_value = "1000")]
    items: usize,

    /// Values at or above this count as "high" (data is drawn from 0..100)
    #[arg(long, default_value = "50")]
    boundary: i64,

    /// Tick of the first event in the event-driven run
    #[arg(long, default_value = "4")]
    first_event: u64,

    /// Write `tick,tasks_run` rows to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Random seed.  Random when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

/// Event kinds of the chained sample: `T0 → T2`, `T1 → T3, T4`.
const KINDS: [&str; 7] = ["T0", "T1", "T2", "T3", "T4", "T5", "T6"];

fn main() -> Result<()> {
    cs_demo::logging::init();
    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(mode = ?args.mode, workers = args.workers, seed, "engine sample");

    let (mut engine, report): (Engine, Box<dyn FnOnce()>) = match args.mode {
        Mode::ActivityScan => activity_scan(&args, seed)?,
        Mode::EventDriven => event_driven(&args, seed)?,
    };

    let final_tick = match &args.csv {
        Some(path) => {
            let mut observer = CsvTickObserver::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let final_tick = engine.start(&mut observer)?;
            if let Some(err) = observer.take_error() {
                bail!("writing {}: {err}", path.display());
            }
            final_tick
        }
        None => engine.start(&mut ProgressObserver)?,
    };
    engine.shutdown();

    info!(final_tick = %final_tick, "simulation ended");
    report();
    Ok(())
}

// ── Activity scan ─────────────────────────────────────────────────────────────

fn activity_scan(args: &Args, seed: u64) -> Result<(Engine, Box<dyn FnOnce()>)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let data: Vec<i64> = (0..args.items).map(|_| rng.gen_range(0..100)).collect();
    let slices = args.workers.min(args.items);
    let classify = Arc::new(Classify::new(data, args.boundary, slices));

    let until = Arc::clone(&classify);
    let mut engine = EngineBuilder::new(EngineConfig::new(args.workers, SimMode::ActivityScan))
        .until(move |_: Tick| until.done())
        .build()?;
    engine.bind_activity(
        ActivitySpec::new("classify", ActivityKind::User, 1, args.items),
        Arc::clone(&classify),
        |c: &Classify, slice: &Slice, tick: Tick| c.map(slice, tick),
    )?;

    let report = move || {
        let [below, above] = classify.reduce();
        info!(below, above, boundary = classify.boundary, "classification");
    };
    Ok((engine, Box::new(report)))
}

// ── Event driven ──────────────────────────────────────────────────────────────

fn chain(event: &Event<u32>, core: &EventCore<u32>) -> HandlerStatus {
    let follow_ups: &[&str] = match event.kind.as_str() {
        "T0" => &["T2"],
        "T1" => &["T3", "T4"],
        _ => &[],
    };
    let next = core.clock().next();
    for kind in follow_ups {
        info!(from = %event.kind, to = *kind, at = %next, "scheduling follow-up");
        if core.schedule(Event::new(*kind, event.payload + 1), next).is_err() {
            return HandlerStatus::Error;
        }
    }
    HandlerStatus::Normal
}

fn event_driven(args: &Args, seed: u64) -> Result<(Engine, Box<dyn FnOnce()>)> {
    let timer = Arc::new(Timer::new("clock", 2));
    let evm = Arc::new(EventManager::<u32>::new(args.workers, Arc::clone(&timer))?);
    for kind in KINDS {
        evm.install_handler(kind, chain)?;
    }

    let first = if SmallRng::seed_from_u64(seed).gen_bool(0.5) { KINDS[0] } else { KINDS[1] };
    evm.schedule(Event::new(first, 0), Tick(args.first_event))?;
    info!(kind = first, at = args.first_event, "first event scheduled");

    let engine = EngineBuilder::new(EngineConfig::new(args.workers, SimMode::EventDriven))
        .timer(timer)
        .events(evm.clone())
        .build()?;
    let report = move || info!(pending = evm.pending_events(), "calendar drained");
    Ok((engine, Box::new(report)))
}
