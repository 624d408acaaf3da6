use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::trace;

/// Current state of a [`Worker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    Working,
}

impl WorkerStatus {
    fn as_u8(self) -> u8 {
        match self {
            WorkerStatus::Idle => 0,
            WorkerStatus::Working => 1,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerStatus::Working,
            _ => WorkerStatus::Idle,
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerStatus::Idle => write!(f, "idle"),
            WorkerStatus::Working => write!(f, "working"),
        }
    }
}

/// A reusable execution slot.
///
/// A worker does not own a thread. Whoever dequeues it from the
/// [`WorkerPool`](crate::pool::WorkerPool) decides where `do_work` runs, and
/// hands the worker back to the pool once the task has returned.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    status: AtomicU8,
}

impl Worker {
    /// Creates an idle worker with the given identity
    pub fn new(id: usize) -> Self {
        Self {
            id,
            status: AtomicU8::new(WorkerStatus::Idle.as_u8()),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn status(&self) -> WorkerStatus {
        WorkerStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Runs `task` to completion on the calling thread.
    ///
    /// The status reads `Working` for the whole duration of the task and flips
    /// back to `Idle` before the output is returned to the caller.
    pub fn do_work<T, F>(&self, task: F) -> T
    where
        F: FnOnce() -> T,
    {
        let _working = StatusGuard::enter(self);
        task()
    }
}

/// Holds a worker in `Working` and resets it to `Idle` on drop, including
/// when the task unwinds.
struct StatusGuard<'a> {
    worker: &'a Worker,
}

impl<'a> StatusGuard<'a> {
    fn enter(worker: &'a Worker) -> Self {
        worker
            .status
            .store(WorkerStatus::Working.as_u8(), Ordering::Release);
        trace!("Worker[{}] started", worker.id);
        Self { worker }
    }
}

impl Drop for StatusGuard<'_> {
    fn drop(&mut self) {
        self.worker
            .status
            .store(WorkerStatus::Idle.as_u8(), Ordering::Release);
        trace!("Worker[{}] finished", self.worker.id);
    }
}
