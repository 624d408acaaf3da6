use crossbeam_channel::{unbounded, Receiver, Sender};
use rayon::Scope;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error};

use crate::metrics::PoolMetrics;
use crate::pool::WorkerPool;
use crate::results::SearchStats;
use crate::worker::Worker;

/// Sent exactly once by every launched task
#[derive(Debug)]
pub struct Completion {
    pub worker_id: usize,
    pub stats: SearchStats,
    pub panicked: bool,
}

/// Counts offloaded tasks that have not reported back yet and collects their
/// stats.
///
/// The counter is raised before a task is spawned and lowered only when its
/// [`Completion`] is received, so it can not reach zero while any task (or any
/// task that task launched) is still running.
#[derive(Debug)]
pub struct CompletionTracker {
    outstanding: AtomicUsize,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionTracker {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            outstanding: AtomicUsize::new(0),
            tx,
            rx,
        }
    }

    /// Number of launched tasks whose completion has not been received
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Runs `task` on `scope` under `worker`.
    ///
    /// Once the task returns (or panics) the worker goes back to `pool` and a
    /// single [`Completion`] carrying the task's stats is sent.
    pub fn launch<'scope, F>(
        &self,
        scope: &Scope<'scope>,
        pool: &'scope WorkerPool,
        worker: Worker,
        task: F,
    ) where
        F: FnOnce(&Scope<'scope>) -> SearchStats + Send + 'scope,
    {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        let tx = self.tx.clone();

        scope.spawn(move |scope| {
            let worker_id = worker.id();
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| worker.do_work(|| task(scope))));

            if let Err(e) = pool.enqueue(worker) {
                error!("Failed to return worker {} to the pool: {}", worker_id, e);
            }

            let completion = match outcome {
                Ok(stats) => Completion {
                    worker_id,
                    stats,
                    panicked: false,
                },
                Err(_) => Completion {
                    worker_id,
                    stats: SearchStats::new(),
                    panicked: true,
                },
            };
            if tx.send(completion).is_err() {
                error!("Completion of worker {} was dropped", worker_id);
            }
        });
    }

    /// Blocks until every launched task has reported back, merging their
    /// stats into `stats`.
    pub fn wait(&self, mut stats: SearchStats, metrics: &PoolMetrics) -> SearchStats {
        while self.outstanding() > 0 {
            let completion = match self.rx.recv() {
                Ok(completion) => completion,
                Err(e) => {
                    error!(
                        "Stopped waiting with {} tasks outstanding: {}",
                        self.outstanding(),
                        e
                    );
                    break;
                }
            };
            self.outstanding.fetch_sub(1, Ordering::SeqCst);

            if completion.panicked {
                error!(
                    "Task on worker {} panicked, its results are lost",
                    completion.worker_id
                );
                metrics.record_panic();
            } else {
                debug!(
                    "Worker {} finished: {} files, {} matches",
                    completion.worker_id,
                    completion.stats.files_total,
                    completion.stats.files_matched
                );
            }
            stats.merge(completion.stats);
        }
        stats
    }
}
