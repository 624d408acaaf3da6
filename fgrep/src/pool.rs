use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;

use crate::errors::{SearchError, SearchResult};
use crate::worker::Worker;

/// Bounded FIFO of idle workers.
///
/// The pool is the only supply of concurrency slots during a search. Size check
/// and mutation happen under the same lock, so two frames racing on
/// `dequeue` can never be handed the same worker and `enqueue` can never push
/// the pool past its capacity.
#[derive(Debug)]
pub struct WorkerPool {
    max: usize,
    workers: Mutex<VecDeque<Worker>>,
}

impl WorkerPool {
    /// Creates an empty pool. A `max` of 0 means enqueue is never refused.
    pub fn new(max: usize) -> Self {
        Self {
            max,
            workers: Mutex::new(VecDeque::with_capacity(max)),
        }
    }

    /// Creates a pool filled with `count` idle workers numbered `0..count`
    pub fn with_workers(count: usize) -> Self {
        let pool = Self::new(count);
        {
            let mut workers = pool.workers.lock();
            workers.extend((0..count).map(Worker::new));
        }
        debug!("Initialised worker pool with {} workers", count);
        pool
    }

    /// Returns a worker to the back of the pool.
    ///
    /// Fails without touching the pool when it already holds `max` workers;
    /// the rejected worker is dropped.
    pub fn enqueue(&self, worker: Worker) -> SearchResult<()> {
        let mut workers = self.workers.lock();
        if self.max != 0 && workers.len() >= self.max {
            return Err(SearchError::pool_full(self.max, worker.id()));
        }
        workers.push_back(worker);
        Ok(())
    }

    /// Takes the next idle worker, or `None` when every worker is busy
    pub fn dequeue(&self) -> Option<Worker> {
        self.workers.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.workers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_enqueue() {
        let pool = WorkerPool::new(0);
        pool.enqueue(Worker::new(1)).unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_dequeue_is_fifo() {
        let pool = WorkerPool::new(0);
        pool.enqueue(Worker::new(1)).unwrap();
        pool.enqueue(Worker::new(2)).unwrap();

        let w1 = pool.dequeue().expect("worker 1");
        assert_eq!(w1.id(), 1);
        assert_eq!(pool.len(), 1);

        let w2 = pool.dequeue().expect("worker 2");
        assert_eq!(w2.id(), 2);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_no_workers() {
        let pool = WorkerPool::new(3);
        assert!(pool.dequeue().is_none());
    }

    #[test]
    fn test_max_workers() {
        let pool = WorkerPool::new(5);
        for id in 1..=5 {
            pool.enqueue(Worker::new(id)).unwrap();
        }

        let err = pool.enqueue(Worker::new(6)).unwrap_err();
        assert!(matches!(
            err,
            SearchError::PoolFull {
                capacity: 5,
                worker_id: 6
            }
        ));
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn test_with_workers_prefills() {
        let pool = WorkerPool::with_workers(4);
        assert_eq!(pool.len(), 4);
        assert!(pool.enqueue(Worker::new(99)).is_err());
    }

    #[test]
    fn test_with_zero_workers() {
        let pool = WorkerPool::with_workers(0);
        assert!(pool.is_empty());
        assert!(pool.dequeue().is_none());
    }

    #[test]
    fn test_dequeue_all_returns_each_worker_once() {
        let pool = WorkerPool::with_workers(8);
        let ids: Vec<usize> = std::iter::from_fn(|| pool.dequeue())
            .map(|w| w.id())
            .collect();

        assert_eq!(ids.len(), 8);
        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique, (0..8).collect::<HashSet<_>>());
    }

    #[test]
    fn test_concurrent_dequeue_never_duplicates() {
        let pool = Arc::new(WorkerPool::with_workers(64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    let mut taken = Vec::new();
                    while let Some(worker) = pool.dequeue() {
                        taken.push(worker.id());
                    }
                    taken
                })
            })
            .collect();

        let mut all: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn test_concurrent_borrow_and_return_keeps_size() {
        let pool = Arc::new(WorkerPool::with_workers(4));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        if let Some(worker) = pool.dequeue() {
                            pool.enqueue(worker).unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pool.len(), 4);
    }
}
