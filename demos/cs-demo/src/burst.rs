//! The worker-pool burst task.

use cs_pool::TaskOutput;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Upper bound (exclusive) of each random step.
pub const MAX_STEP: i64 = 40;

#[derive(Clone, Copy, Debug)]
pub struct BurstInput {
    pub index:      usize,
    pub iterations: u64,
    pub seed:       u64,
}

/// Sum `iterations` random steps in `0..MAX_STEP`, adding on even
/// iterations and subtracting on odd ones.
pub fn random_accumulator(input: BurstInput) -> TaskOutput<i64> {
    let mut rng = SmallRng::seed_from_u64(input.seed);
    let mut acc = 0i64;
    for i in 0..input.iterations {
        let step = rng.gen_range(0..MAX_STEP);
        if i % 2 == 0 {
            acc += step;
        } else {
            acc -= step;
        }
    }
    TaskOutput::ok(acc)
}
