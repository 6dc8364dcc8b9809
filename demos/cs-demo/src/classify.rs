//! Map/reduce over a data set: each slice counts values below and at-or-above
//! a boundary; the run ends once every item has been counted.

use cs_core::Tick;
use cs_engine::Slice;
use cs_pool::TaskStatus;
use std::sync::Mutex;

pub struct Classify {
    pub data:     Vec<i64>,
    pub boundary: i64,
    /// `[below, at_or_above]` per slice, written by the slice's own task.
    pub results:  Mutex<Vec<[usize; 2]>>,
}

impl Classify {
    pub fn new(data: Vec<i64>, boundary: i64, slices: usize) -> Self {
        Self { data, boundary, results: Mutex::new(vec![[0, 0]; slices]) }
    }

    /// Activity body for one slice.
    pub fn map(&self, slice: &Slice, _tick: Tick) -> TaskStatus {
        let mut counts = [0usize; 2];
        for &value in &self.data[slice.range.clone()] {
            counts[usize::from(value >= self.boundary)] += 1;
        }
        let Ok(mut results) = self.results.lock() else {
            return TaskStatus::Error;
        };
        match results.get_mut(slice.index) {
            Some(slot) => {
                *slot = counts;
                TaskStatus::Success
            }
            None => TaskStatus::Error,
        }
    }

    /// Totals across all slices.
    pub fn reduce(&self) -> [usize; 2] {
        let results = match self.results.lock() {
            Ok(results) => results,
            Err(poisoned) => poisoned.into_inner(),
        };
        results.iter().fold([0, 0], |acc, r| [acc[0] + r[0], acc[1] + r[1]])
    }

    /// Termination predicate: every item is accounted for.
    pub fn done(&self) -> bool {
        let [below, above] = self.reduce();
        below + above >= self.data.len()
    }
}
