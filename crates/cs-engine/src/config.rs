use crate::{EngineError, EngineResult};

/// How the engine decides to stop.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimMode {
    /// A termination predicate is evaluated once per tick.
    #[default]
    ActivityScan,
    /// Stop once no events are pending and the controller is idle.
    EventDriven,
}

/// Engine settings.
///
/// | Field     | Default        |
/// |-----------|----------------|
/// | `workers` | 10             |
/// | `mode`    | `ActivityScan` |
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Activity pool threads; also the number of slices per activity.
    pub workers: usize,
    pub mode:    SimMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { workers: 10, mode: SimMode::ActivityScan }
    }
}

impl EngineConfig {
    pub fn new(workers: usize, mode: SimMode) -> Self {
        Self { workers, mode }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.workers == 0 {
            return Err(EngineError::Config("worker count must be > 0".into()));
        }
        Ok(())
    }
}
