//! Background worker pool.
//!
//! Work that must stay off the audio callback (disk streaming, analysis,
//! preset loading) is queued here. Each worker owns a three-tier priority
//! queue served FIFO within a tier; submission is round-robin across
//! workers. An idle worker steals normal- and low-priority work from the
//! most backlogged peer, but never high-priority work, so the high tier
//! keeps its per-worker submission order.

use std::collections::VecDeque;
use std::io;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// How long an idle worker waits before rescanning peers for work to
/// steal.
const STEAL_POLL: Duration = Duration::from_millis(5);

/// Urgency tier for a submitted task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TaskPriority {
    /// Served before everything else on its worker; never stolen.
    High,
    /// The default tier.
    #[default]
    Normal,
    /// Served only when nothing else is queued.
    Low,
}

/// Errors from worker pool construction and task submission.
#[derive(Debug, Error)]
pub enum WorkerPoolError {
    /// The pool has shut down and no longer accepts tasks.
    #[error("worker pool is shut down")]
    ShutDown,
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
}

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct TierQueue {
    high: VecDeque<Task>,
    normal: VecDeque<Task>,
    low: VecDeque<Task>,
}

impl TierQueue {
    fn push(&mut self, priority: TaskPriority, task: Task) {
        match priority {
            TaskPriority::High => self.high.push_back(task),
            TaskPriority::Normal => self.normal.push_back(task),
            TaskPriority::Low => self.low.push_back(task),
        }
    }

    /// Next task for the owning worker: highest tier first, FIFO within.
    fn pop(&mut self) -> Option<Task> {
        self.high
            .pop_front()
            .or_else(|| self.normal.pop_front())
            .or_else(|| self.low.pop_front())
    }

    /// Takes a task a thief is allowed to run. Thieves take from the back
    /// so the owner keeps its FIFO head.
    fn steal(&mut self) -> Option<Task> {
        self.normal.pop_back().or_else(|| self.low.pop_back())
    }

    /// Number of tasks a thief could take.
    fn stealable(&self) -> usize {
        self.normal.len() + self.low.len()
    }

    fn len(&self) -> usize {
        self.high.len() + self.normal.len() + self.low.len()
    }

    fn clear(&mut self) {
        self.high.clear();
        self.normal.clear();
        self.low.clear();
    }
}

struct WorkerQueue {
    tasks: Mutex<TierQueue>,
    ready: Condvar,
}

struct PoolShared {
    queues: Vec<WorkerQueue>,
    shutdown: AtomicBool,
}

fn worker_loop(shared: &PoolShared, index: usize) {
    while let Some(task) = next_task(shared, index) {
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            tracing::warn!(worker = index, "worker task panicked, continuing");
        }
    }
}

fn next_task(shared: &PoolShared, index: usize) -> Option<Task> {
    loop {
        {
            let mut tasks = shared.queues[index].tasks.lock();
            if let Some(task) = tasks.pop() {
                return Some(task);
            }
        }
        if shared.shutdown.load(Ordering::Acquire) {
            return None;
        }
        if let Some(task) = steal(shared, index) {
            return Some(task);
        }
        let mut tasks = shared.queues[index].tasks.lock();
        if let Some(task) = tasks.pop() {
            return Some(task);
        }
        if shared.shutdown.load(Ordering::Acquire) {
            return None;
        }
        let _ = shared.queues[index]
            .ready
            .wait_for(&mut tasks, STEAL_POLL);
    }
}

/// Steals from the peer with the largest stealable backlog. Only one
/// queue lock is held at a time.
fn steal(shared: &PoolShared, thief: usize) -> Option<Task> {
    let mut victim = None;
    let mut backlog = 0;
    for (index, queue) in shared.queues.iter().enumerate() {
        if index == thief {
            continue;
        }
        let stealable = queue.tasks.lock().stealable();
        if stealable > backlog {
            backlog = stealable;
            victim = Some(index);
        }
    }
    shared.queues[victim?].tasks.lock().steal()
}

/// Fixed-size pool of priority worker threads.
///
/// Sized from the machine's available parallelism clamped to configured
/// bounds. Tasks are closures; a panicking task is caught and logged and
/// the worker keeps running.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    next: AtomicUsize,
}

impl WorkerPool {
    /// Lower worker bound used by [`WorkerPool::new`].
    pub const DEFAULT_MIN_WORKERS: usize = 1;
    /// Upper worker bound used by [`WorkerPool::new`].
    pub const DEFAULT_MAX_WORKERS: usize = 4;

    /// Creates a pool sized for this machine within the default bounds.
    ///
    /// # Errors
    ///
    /// [`WorkerPoolError::Spawn`] if a worker thread cannot be started.
    pub fn new() -> Result<Self, WorkerPoolError> {
        Self::with_limits(Self::DEFAULT_MIN_WORKERS, Self::DEFAULT_MAX_WORKERS)
    }

    /// Creates a pool with `available_parallelism` clamped to
    /// `[min, max]`. Bounds below 1 are raised to 1; `max` is raised to
    /// `min` when inverted.
    ///
    /// # Errors
    ///
    /// [`WorkerPoolError::Spawn`] if a worker thread cannot be started.
    /// Workers spawned before the failure are shut down and joined.
    pub fn with_limits(min: usize, max: usize) -> Result<Self, WorkerPoolError> {
        let min = min.max(1);
        let max = max.max(min);
        let parallelism = thread::available_parallelism().map_or(min, NonZeroUsize::get);
        let count = parallelism.clamp(min, max);

        let shared = Arc::new(PoolShared {
            queues: (0..count)
                .map(|_| WorkerQueue {
                    tasks: Mutex::new(TierQueue::default()),
                    ready: Condvar::new(),
                })
                .collect(),
            shutdown: AtomicBool::new(false),
        });

        let mut handles = Vec::with_capacity(count);
        for index in 0..count {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("resonar-worker-{index}"))
                .spawn(move || worker_loop(&worker_shared, index));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    shared.shutdown.store(true, Ordering::Release);
                    for queue in &shared.queues {
                        queue.ready.notify_all();
                    }
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(WorkerPoolError::Spawn(source));
                }
            }
        }

        tracing::debug!(workers = count, "worker pool started");
        Ok(Self {
            shared,
            handles: Mutex::new(handles),
            next: AtomicUsize::new(0),
        })
    }

    /// Number of worker threads in the pool.
    pub fn worker_count(&self) -> usize {
        self.shared.queues.len()
    }

    /// Tasks queued across all workers. In-flight tasks are not counted.
    pub fn pending(&self) -> usize {
        self.shared
            .queues
            .iter()
            .map(|queue| queue.tasks.lock().len())
            .sum()
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shared.shutdown.load(Ordering::Acquire)
    }

    /// Queues a task on the next worker in round-robin order and wakes it.
    ///
    /// # Errors
    ///
    /// [`WorkerPoolError::ShutDown`] once the pool has shut down.
    pub fn submit<F>(&self, priority: TaskPriority, task: F) -> Result<(), WorkerPoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.shared.queues.len();
        let queue = &self.shared.queues[index];
        {
            let mut tasks = queue.tasks.lock();
            // Checked under the queue lock so a task can never land behind
            // shutdown's queue sweep.
            if self.shared.shutdown.load(Ordering::Acquire) {
                return Err(WorkerPoolError::ShutDown);
            }
            tasks.push(priority, Box::new(task));
        }
        queue.ready.notify_one();
        Ok(())
    }

    /// Stops intake, discards queued tasks, and joins the workers.
    ///
    /// Tasks already running are allowed to finish. Calling this more than
    /// once is harmless.
    pub fn shutdown(&self) {
        if !self.shared.shutdown.swap(true, Ordering::AcqRel) {
            let dropped: usize = self
                .shared
                .queues
                .iter()
                .map(|queue| {
                    let mut tasks = queue.tasks.lock();
                    let len = tasks.len();
                    tasks.clear();
                    len
                })
                .sum();
            if dropped > 0 {
                tracing::debug!(dropped, "discarded queued tasks at shutdown");
            }
        }
        for queue in &self.shared.queues {
            queue.ready.notify_all();
        }
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
