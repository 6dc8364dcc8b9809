//! Activities: periodic functions applied slice-by-slice over shared data.

use std::ops::Range;
use std::sync::Arc;

use cs_core::{Tick, split_even};
use cs_pool::TaskStatus;

/// When in the tick an activity runs.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivityKind {
    /// Before termination is evaluated, at the tick that is ending.
    AfterStep,
    /// After the clock advances.  ACTIVITY_SCAN mode only.
    User,
}

/// Static description of an activity.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivitySpec {
    pub name:         String,
    pub kind:         ActivityKind,
    /// Run every `period_ticks` ticks.  Must be > 0.
    pub period_ticks: u64,
    /// Length of the data the activity is partitioned over.
    pub items:        usize,
}

impl ActivitySpec {
    pub fn new(name: impl Into<String>, kind: ActivityKind, period_ticks: u64, items: usize) -> Self {
        Self { name: name.into(), kind, period_ticks, items }
    }
}

/// The part of an activity's item range one task processes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slice {
    /// Position of this slice, `0..total`.
    pub index: usize,
    pub range: Range<usize>,
    /// Number of slices the activity was split into.
    pub total: usize,
}

/// User code run once per slice: `(data, slice, tick) -> status`.
pub trait ActivityFn<D>: Send + Sync + 'static {
    fn run(&self, data: &D, slice: &Slice, tick: Tick) -> TaskStatus;
}

impl<D, F> ActivityFn<D> for F
where
    F: Fn(&D, &Slice, Tick) -> TaskStatus + Send + Sync + 'static,
{
    fn run(&self, data: &D, slice: &Slice, tick: Tick) -> TaskStatus {
        self(data, slice, tick)
    }
}

// ── Bound activity ────────────────────────────────────────────────────────────

/// Type-erased `(data, function)` pair.
pub(crate) trait SliceRunner: Send + Sync {
    fn run_slice(&self, slice: &Slice, tick: Tick) -> TaskStatus;
}

struct Bound<D, F> {
    data: Arc<D>,
    func: F,
}

impl<D, F> SliceRunner for Bound<D, F>
where
    D: Send + Sync + 'static,
    F: ActivityFn<D>,
{
    fn run_slice(&self, slice: &Slice, tick: Tick) -> TaskStatus {
        self.func.run(&self.data, slice, tick)
    }
}

pub(crate) struct Activity {
    pub(crate) spec:     ActivitySpec,
    pub(crate) slices:   Vec<Slice>,
    pub(crate) runner:   Arc<dyn SliceRunner>,
    pub(crate) last_run: Option<Tick>,
}

impl Activity {
    /// Bind `func` to `data`, split into at most `workers` slices.
    pub(crate) fn bind<D, F>(spec: ActivitySpec, data: Arc<D>, func: F, workers: usize) -> Self
    where
        D: Send + Sync + 'static,
        F: ActivityFn<D>,
    {
        let ranges = split_even(spec.items, workers);
        let total = ranges.len();
        let slices = ranges
            .into_iter()
            .enumerate()
            .map(|(index, range)| Slice { index, range, total })
            .collect();
        Self {
            spec,
            slices,
            runner: Arc::new(Bound { data, func }),
            last_run: None,
        }
    }

    pub(crate) fn is_due(&self, tick: Tick) -> bool {
        match self.last_run {
            None => true,
            Some(last) => tick.since(last) % self.spec.period_ticks == 0,
        }
    }
}
