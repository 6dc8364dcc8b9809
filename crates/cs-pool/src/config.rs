use crate::{PoolError, PoolResult};

/// Worker pool sizing.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Used in thread names and log fields.
    pub name:           String,
    pub workers:        usize,
    /// Maximum number of tasks waiting for a worker.
    pub queue_capacity: usize,
}

impl PoolConfig {
    /// `workers` threads and room for `workers * 10` queued tasks.
    pub fn new(name: impl Into<String>, workers: usize) -> Self {
        Self {
            name: name.into(),
            workers,
            queue_capacity: workers.saturating_mul(10),
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.workers == 0 {
            return Err(PoolError::Config(format!("pool `{}`: worker count must be > 0", self.name)));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::Config(format!("pool `{}`: queue capacity must be > 0", self.name)));
        }
        Ok(())
    }
}
