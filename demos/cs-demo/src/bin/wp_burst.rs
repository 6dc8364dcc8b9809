//! wp-burst — floods a worker pool with random-accumulator tasks.
//!
//! ```bash
//! wp-burst --tasks 1000 --workers 8 --iterations 100000
//! RUST_LOG=cs_pool=trace wp-burst -t 20 -w 2
//! ```

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use cs_demo::burst::{BurstInput, random_accumulator};
use cs_pool::{PoolConfig, WorkerPool};

#[derive(Parser, Debug)]
#[command(name = "wp-burst")]
#[command(version, about = "Enqueue a burst of CPU-bound tasks and collect their results", long_about = None)]
struct Args {
    /// Number of tasks to enqueue
    #[arg(short = 't', long, default_value = "100")]
    tasks: usize,

    /// Worker threads
    #[arg(short = 'w', long, default_value = "4")]
    workers: usize,

    /// Random steps per task
    #[arg(short = 'n', long, default_value = "100000")]
    iterations: u64,

    /// Base seed; task `i` uses `seed + i`.  Random when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    cs_demo::logging::init();
    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    info!(tasks = args.tasks, workers = args.workers, iterations = args.iterations, seed, "starting burst");

    // A deep queue so the producer rarely blocks.
    let config = PoolConfig::new("burst", args.workers).with_queue_capacity(args.workers.max(1) * 100);
    let pool = WorkerPool::<i64>::new(config)?;
    pool.start()?;

    let started = Instant::now();
    let ids = (0..args.tasks)
        .map(|index| {
            let input = BurstInput { index, iterations: args.iterations, seed: seed.wrapping_add(index as u64) };
            pool.enqueue(random_accumulator, input)
        })
        .collect::<Result<Vec<_>, _>>()?;

    for &id in &ids {
        pool.wait(id)?;
    }

    let mut total = 0i64;
    for (index, id) in ids.into_iter().enumerate() {
        let result = pool.pop_result(id)?;
        debug!(task = index, status = ?result.status, output = ?result.output, "result");
        total += result.output.unwrap_or_default();
    }
    pool.shutdown();

    info!(elapsed_ms = started.elapsed().as_millis() as u64, total, "burst complete");
    Ok(())
}
