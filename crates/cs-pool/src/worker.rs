//! Worker threads.
//!
//! A worker sleeps on its private wake semaphore.  The dispatcher posts it
//! after storing a task in `assigned`; shutdown posts it with no task and the
//! `shutdown` flag raised.

use std::panic::{AssertUnwindSafe, catch_unwind};

use cs_core::{Semaphore, WorkerId};
use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::task::{PendingTask, TaskOutput, TaskStatus};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum WorkerStatus {
    /// Not running (pool not started, or thread exited).
    Ready,
    /// Idle, counted by the free-worker semaphore.
    Waiting,
    TaskAssigned,
    Working,
}

struct WorkerState<O> {
    status:   WorkerStatus,
    assigned: Option<PendingTask<O>>,
    shutdown: bool,
}

pub(crate) struct Worker<O> {
    pub(crate) id: WorkerId,
    state:         Mutex<WorkerState<O>>,
    wake:          Semaphore,
}

impl<O: Send + 'static> Worker<O> {
    pub(crate) fn new(id: WorkerId) -> Self {
        Self {
            id,
            state: Mutex::new(WorkerState {
                status:   WorkerStatus::Ready,
                assigned: None,
                shutdown: false,
            }),
            wake: Semaphore::new(0),
        }
    }

    pub(crate) fn status(&self) -> WorkerStatus {
        self.state.lock().status
    }

    /// Put the worker in the idle set before its thread is spawned.
    pub(crate) fn arm(&self) {
        let mut state = self.state.lock();
        state.status = WorkerStatus::Waiting;
        state.shutdown = false;
    }

    /// Hand `task` to this worker if it is idle; gives the task back otherwise.
    pub(crate) fn try_assign(&self, task: PendingTask<O>) -> Result<(), PendingTask<O>> {
        {
            let mut state = self.state.lock();
            if state.status != WorkerStatus::Waiting {
                return Err(task);
            }
            trace!(worker = %self.id, task = %task.id, "task assigned");
            state.assigned = Some(task);
            state.status = WorkerStatus::TaskAssigned;
        }
        self.wake.release();
        Ok(())
    }

    /// Ask the thread to exit once it has no assigned task.
    pub(crate) fn request_shutdown(&self) {
        self.state.lock().shutdown = true;
        self.wake.release();
    }

    /// Thread body.  `free_workers` is the pool-wide idle counter.
    pub(crate) fn run(&self, pool: &str, free_workers: &Semaphore) {
        loop {
            self.wake.acquire();
            let task = {
                let mut state = self.state.lock();
                match state.assigned.take() {
                    Some(task) => {
                        state.status = WorkerStatus::Working;
                        task
                    }
                    None if state.shutdown => break,
                    None => continue,
                }
            };

            task.slot.mark_running();
            let output = match catch_unwind(AssertUnwindSafe(task.job)) {
                Ok(output) => output,
                Err(_) => {
                    warn!(pool, worker = %self.id, task = %task.id, "task panicked");
                    TaskOutput::failed()
                }
            };
            if output.status == TaskStatus::Error {
                trace!(pool, worker = %self.id, task = %task.id, "task reported failure");
            }

            self.state.lock().status = WorkerStatus::Waiting;
            free_workers.release();
            task.slot.complete(output);
        }

        self.state.lock().status = WorkerStatus::Ready;
        trace!(pool, worker = %self.id, "worker exiting");
    }
}
