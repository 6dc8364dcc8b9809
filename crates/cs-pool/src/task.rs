//! Task contract and per-task completion slot.

use cs_core::TaskId;
use parking_lot::{Condvar, Mutex};

/// Outcome reported by a task function.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TaskStatus {
    Success,
    Error,
}

/// What a task function returns: a status and an optional output value.
///
/// A non-success status is application data.  The pool records it as-is and
/// never retries.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TaskOutput<O> {
    pub status: TaskStatus,
    pub output: Option<O>,
}

impl<O> TaskOutput<O> {
    pub fn new(status: TaskStatus, output: Option<O>) -> Self {
        Self { status, output }
    }

    /// Success carrying `output`.
    pub fn ok(output: O) -> Self {
        Self { status: TaskStatus::Success, output: Some(output) }
    }

    /// Success with no output.
    pub fn done() -> Self {
        Self { status: TaskStatus::Success, output: None }
    }

    /// Failure with no output.
    pub fn failed() -> Self {
        Self { status: TaskStatus::Error, output: None }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }
}

impl<O> From<TaskStatus> for TaskOutput<O> {
    fn from(status: TaskStatus) -> Self {
        Self { status, output: None }
    }
}

/// A function the pool can run: `(input) -> (status, optional output)`.
///
/// Implemented for every `Fn(I) -> TaskOutput<O>` closure; implement it by
/// hand for stateful task objects.
pub trait TaskFn<I, O>: Send + Sync + 'static {
    fn call(&self, input: I) -> TaskOutput<O>;
}

impl<I, O, F> TaskFn<I, O> for F
where
    F: Fn(I) -> TaskOutput<O> + Send + Sync + 'static,
{
    fn call(&self, input: I) -> TaskOutput<O> {
        self(input)
    }
}

/// Where a task is in its lifecycle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TaskRuntimeStatus {
    Waiting,
    Running,
    Done,
    /// Not tracked by the pool (never issued, or already popped).
    Invalid,
}

// ── Internal ──────────────────────────────────────────────────────────────────

pub(crate) type Job<O> = Box<dyn FnOnce() -> TaskOutput<O> + Send>;

/// A task travelling through the queue to a worker.
pub(crate) struct PendingTask<O> {
    pub(crate) id:   TaskId,
    pub(crate) job:  Job<O>,
    pub(crate) slot: std::sync::Arc<TaskSlot<O>>,
}

struct SlotState<O> {
    status: TaskRuntimeStatus,
    result: Option<TaskOutput<O>>,
}

/// Result-table entry: status, recorded result, and the completion signal.
pub(crate) struct TaskSlot<O> {
    id:    TaskId,
    state: Mutex<SlotState<O>>,
    done:  Condvar,
}

impl<O> TaskSlot<O> {
    pub(crate) fn new(id: TaskId) -> Self {
        Self {
            id,
            state: Mutex::new(SlotState { status: TaskRuntimeStatus::Waiting, result: None }),
            done:  Condvar::new(),
        }
    }

    pub(crate) fn mark_running(&self) {
        self.state.lock().status = TaskRuntimeStatus::Running;
    }

    /// Record the result and fire the completion signal.
    ///
    /// # Panics
    /// If called twice for the same task.
    pub(crate) fn complete(&self, output: TaskOutput<O>) {
        let mut state = self.state.lock();
        assert!(
            state.status != TaskRuntimeStatus::Done,
            "completion fired twice for {}",
            self.id
        );
        state.result = Some(output);
        state.status = TaskRuntimeStatus::Done;
        self.done.notify_all();
    }

    /// Block until the task is `Done`.
    pub(crate) fn wait(&self) {
        let mut state = self.state.lock();
        self.done.wait_while(&mut state, |s| s.status != TaskRuntimeStatus::Done);
    }

    pub(crate) fn status(&self) -> TaskRuntimeStatus {
        self.state.lock().status
    }

    pub(crate) fn take_result(&self) -> Option<TaskOutput<O>> {
        self.state.lock().result.take()
    }
}

impl<O: Clone> TaskSlot<O> {
    pub(crate) fn clone_result(&self) -> Option<TaskOutput<O>> {
        self.state.lock().result.clone()
    }
}
