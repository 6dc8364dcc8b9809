//! `WorkerPool` and its cloneable `PoolHandle`.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cs_core::{IdSequence, Semaphore, TaskId, WorkerId};
use cs_queue::BoundedQueue;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::task::{Job, PendingTask, TaskSlot};
use crate::worker::Worker;
use crate::{
    PoolConfig, PoolError, PoolResult, TaskFn, TaskOutput, TaskRuntimeStatus, WorkerStatus,
};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum PoolStatus {
    Ready,
    Working,
}

type TaskQueue<O> = BoundedQueue<PendingTask<O>>;

struct PoolShared<O> {
    name:           String,
    queue_capacity: NonZeroUsize,
    status:         Mutex<PoolStatus>,
    /// `Some` exactly while the pool accepts work.  A fresh queue per start.
    queue:          Mutex<Option<Arc<TaskQueue<O>>>>,
    table:          Mutex<BTreeMap<TaskId, Arc<TaskSlot<O>>>>,
    ids:            IdSequence,
    free_workers:   Semaphore,
    workers:        Vec<Arc<Worker<O>>>,
}

struct PoolThreads {
    dispatcher: JoinHandle<()>,
    workers:    Vec<JoinHandle<()>>,
}

// ── PoolHandle ────────────────────────────────────────────────────────────────

/// Cloneable access to a pool's task operations, without its lifecycle.
///
/// Tasks running on the pool use a handle to enqueue and await further tasks.
pub struct PoolHandle<O> {
    shared: Arc<PoolShared<O>>,
}

impl<O> Clone for PoolHandle<O> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<O: Send + 'static> PoolHandle<O> {
    /// Queue `func(input)` and return its id.
    ///
    /// Blocks while the queue is full.  Fails with `NotStarted` unless the pool
    /// is `Working`, and with `ShutDown` if shutdown began before the task was
    /// queued.
    pub fn enqueue<I, F>(&self, func: F, input: I) -> PoolResult<TaskId>
    where
        I: Send + 'static,
        F: TaskFn<I, O>,
    {
        self.submit(move || func.call(input))
    }

    /// Queue a one-shot closure.
    pub fn submit(
        &self,
        job: impl FnOnce() -> TaskOutput<O> + Send + 'static,
    ) -> PoolResult<TaskId> {
        self.enqueue_job(Box::new(job))
    }

    fn enqueue_job(&self, job: Job<O>) -> PoolResult<TaskId> {
        let shared = &self.shared;
        if *shared.status.lock() != PoolStatus::Working {
            return Err(PoolError::NotStarted(shared.name.clone()));
        }
        let Some(queue) = shared.queue.lock().clone() else {
            return Err(PoolError::ShutDown(shared.name.clone()));
        };

        let id = shared.ids.next_task();
        let slot = Arc::new(TaskSlot::new(id));
        {
            let mut table = shared.table.lock();
            let previous = table.insert(id, Arc::clone(&slot));
            assert!(previous.is_none(), "duplicate {id} in pool `{}`", shared.name);
        }

        match queue.enqueue(PendingTask { id, job, slot }) {
            Ok(()) => {
                trace!(pool = %shared.name, task = %id, "task enqueued");
                Ok(id)
            }
            Err(_) => {
                shared.table.lock().remove(&id);
                Err(PoolError::ShutDown(shared.name.clone()))
            }
        }
    }

    fn slot(&self, id: TaskId) -> PoolResult<Arc<TaskSlot<O>>> {
        self.shared.table.lock().get(&id).cloned().ok_or(PoolError::UnknownTask(id))
    }

    /// Block until task `id` is `Done`.
    pub fn wait(&self, id: TaskId) -> PoolResult<()> {
        self.slot(id)?.wait();
        Ok(())
    }

    /// Wait for task `id`, then remove it from the result table and return
    /// its result.  Exactly one caller should pop a given id.
    pub fn pop_result(&self, id: TaskId) -> PoolResult<TaskOutput<O>> {
        let slot = self.slot(id)?;
        slot.wait();
        self.shared.table.lock().remove(&id);
        slot.take_result().ok_or(PoolError::UnknownTask(id))
    }

    /// Lifecycle of task `id`; `Invalid` if the pool does not track it.
    pub fn status(&self, id: TaskId) -> TaskRuntimeStatus {
        match self.slot(id) {
            Ok(slot) => slot.status(),
            Err(_) => TaskRuntimeStatus::Invalid,
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

impl<O: Clone + Send + 'static> PoolHandle<O> {
    /// Wait for task `id` and return a copy of its result.  Leaves the entry
    /// in the table, so it may be called any number of times.
    pub fn get_result(&self, id: TaskId) -> PoolResult<TaskOutput<O>> {
        let slot = self.slot(id)?;
        slot.wait();
        slot.clone_result().ok_or(PoolError::UnknownTask(id))
    }
}

// ── WorkerPool ────────────────────────────────────────────────────────────────

/// A dispatcher thread plus a fixed set of worker threads.
///
/// Created `Ready`; [`start`][Self::start] spawns the threads and
/// [`shutdown`][Self::shutdown] lets queued work finish, then joins them.  A
/// pool can be started again after a shutdown.  Dropping a running pool shuts
/// it down.
pub struct WorkerPool<O: Send + 'static> {
    handle:    PoolHandle<O>,
    threads:   Mutex<Option<PoolThreads>>,
    /// Serializes `start` and `shutdown`.
    lifecycle: Mutex<()>,
}

impl<O: Send + 'static> WorkerPool<O> {
    pub fn new(config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        let workers = (0..config.workers)
            .map(|i| {
                let id = WorkerId::try_from(i)
                    .map_err(|_| PoolError::Config(format!("too many workers: {}", config.workers)))?;
                Ok(Arc::new(Worker::new(id)))
            })
            .collect::<PoolResult<Vec<_>>>()?;
        let queue_capacity = NonZeroUsize::new(config.queue_capacity)
            .ok_or_else(|| PoolError::Config("queue capacity must be > 0".into()))?;

        let shared = PoolShared {
            name: config.name,
            queue_capacity,
            status: Mutex::new(PoolStatus::Ready),
            queue: Mutex::new(None),
            table: Mutex::new(BTreeMap::new()),
            ids: IdSequence::new(),
            free_workers: Semaphore::new(config.workers),
            workers,
        };
        Ok(Self {
            handle:    PoolHandle { shared: Arc::new(shared) },
            threads:   Mutex::new(None),
            lifecycle: Mutex::new(()),
        })
    }

    /// A cloneable handle for enqueueing from other threads or from tasks.
    pub fn handle(&self) -> PoolHandle<O> {
        self.handle.clone()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Spawn the workers, then the dispatcher, and move to `Working`.
    pub fn start(&self) -> PoolResult<()> {
        let _lifecycle = self.lifecycle.lock();
        let shared = &self.handle.shared;
        if *shared.status.lock() == PoolStatus::Working {
            return Err(PoolError::AlreadyRunning(shared.name.clone()));
        }

        let queue = Arc::new(BoundedQueue::with_reclaim(
            format!("{}-queue", shared.name),
            shared.queue_capacity,
            |task: PendingTask<O>| task.slot.complete(TaskOutput::failed()),
        ));

        let mut worker_threads = Vec::with_capacity(shared.workers.len());
        for worker in &shared.workers {
            worker.arm();
            match self.spawn_worker(Arc::clone(worker)) {
                Ok(handle) => worker_threads.push(handle),
                Err(err) => {
                    self.abort_start(worker_threads);
                    return Err(err);
                }
            }
        }

        let dispatcher = {
            let shared = Arc::clone(shared);
            let queue = Arc::clone(&queue);
            thread::Builder::new()
                .name(format!("{}-dispatch", shared.name))
                .spawn(move || dispatch_loop(&shared, &queue))
        };
        let dispatcher = match dispatcher {
            Ok(handle) => handle,
            Err(source) => {
                self.abort_start(worker_threads);
                return Err(PoolError::Spawn { pool: shared.name.clone(), source });
            }
        };

        *shared.queue.lock() = Some(queue);
        *self.threads.lock() = Some(PoolThreads { dispatcher, workers: worker_threads });
        *shared.status.lock() = PoolStatus::Working;
        info!(pool = %shared.name, workers = shared.workers.len(),
              queue_capacity = shared.queue_capacity.get(), "pool started");
        Ok(())
    }

    fn spawn_worker(&self, worker: Arc<Worker<O>>) -> PoolResult<JoinHandle<()>> {
        let shared = Arc::clone(&self.handle.shared);
        thread::Builder::new()
            .name(format!("{}-worker-{}", shared.name, worker.id.0))
            .spawn(move || worker.run(&shared.name, &shared.free_workers))
            .map_err(|source| PoolError::Spawn { pool: self.handle.shared.name.clone(), source })
    }

    /// Unwind a partially spawned start.
    fn abort_start(&self, spawned: Vec<JoinHandle<()>>) {
        let shared = &self.handle.shared;
        for worker in &shared.workers {
            worker.request_shutdown();
        }
        for handle in spawned {
            let _ = handle.join();
        }
    }

    /// Stop admitting work, let queued and running tasks finish, then join
    /// every thread and return to `Ready`.
    ///
    /// A no-op on a pool that is already `Ready`.
    pub fn shutdown(&self) {
        let _lifecycle = self.lifecycle.lock();
        let shared = &self.handle.shared;
        if *shared.status.lock() == PoolStatus::Ready {
            return;
        }

        let queue = shared.queue.lock().take();
        if let Some(queue) = &queue {
            debug!(pool = %shared.name, pending = queue.len(), "closing task queue");
            queue.close();
        }

        if let Some(threads) = self.threads.lock().take() {
            if threads.dispatcher.join().is_err() {
                warn!(pool = %shared.name, "dispatcher thread panicked");
            }
            for worker in &shared.workers {
                worker.request_shutdown();
            }
            for handle in threads.workers {
                if handle.join().is_err() {
                    warn!(pool = %shared.name, "worker thread panicked");
                }
            }
        }
        drop(queue);

        *shared.status.lock() = PoolStatus::Ready;
        info!(pool = %shared.name, tasks_issued = shared.ids.issued(), "pool stopped");
    }

    // ── Task operations ───────────────────────────────────────────────────

    pub fn enqueue<I, F>(&self, func: F, input: I) -> PoolResult<TaskId>
    where
        I: Send + 'static,
        F: TaskFn<I, O>,
    {
        self.handle.enqueue(func, input)
    }

    pub fn submit(
        &self,
        job: impl FnOnce() -> TaskOutput<O> + Send + 'static,
    ) -> PoolResult<TaskId> {
        self.handle.submit(job)
    }

    pub fn wait(&self, id: TaskId) -> PoolResult<()> {
        self.handle.wait(id)
    }

    pub fn pop_result(&self, id: TaskId) -> PoolResult<TaskOutput<O>> {
        self.handle.pop_result(id)
    }

    pub fn status(&self, id: TaskId) -> TaskRuntimeStatus {
        self.handle.status(id)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn pool_status(&self) -> PoolStatus {
        *self.handle.shared.status.lock()
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn worker_count(&self) -> usize {
        self.handle.shared.workers.len()
    }

    pub fn worker_statuses(&self) -> Vec<WorkerStatus> {
        self.handle.shared.workers.iter().map(|w| w.status()).collect()
    }

    /// Tasks queued but not yet handed to a worker.
    pub fn queue_len(&self) -> usize {
        self.handle.shared.queue.lock().as_ref().map_or(0, |q| q.len())
    }

    /// Entries in the result table (issued and not yet popped).
    pub fn tracked_tasks(&self) -> usize {
        self.handle.shared.table.lock().len()
    }
}

impl<O: Clone + Send + 'static> WorkerPool<O> {
    pub fn get_result(&self, id: TaskId) -> PoolResult<TaskOutput<O>> {
        self.handle.get_result(id)
    }
}

impl<O: Send + 'static> Drop for WorkerPool<O> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

fn dispatch_loop<O: Send + 'static>(shared: &PoolShared<O>, queue: &TaskQueue<O>) {
    while let Ok(mut task) = queue.dequeue() {
        shared.free_workers.acquire();
        // Every permit is backed by at least one `Waiting` worker, and only
        // this thread assigns.
        let mut placed = false;
        for worker in &shared.workers {
            match worker.try_assign(task) {
                Ok(()) => {
                    placed = true;
                    break;
                }
                Err(back) => task = back,
            }
        }
        assert!(placed, "pool `{}`: free-worker permit with no waiting worker", shared.name);
    }
    debug!(pool = %shared.name, "dispatcher exiting");
}
