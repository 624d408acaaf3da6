use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Tracks how the dispatcher used the worker pool
#[derive(Debug, Default)]
pub struct PoolMetrics {
    offloaded: AtomicU64,
    inline: AtomicU64,
    splits: AtomicU64,
    panicked: AtomicU64,
}

impl PoolMetrics {
    /// Creates a new PoolMetrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a subdirectory handed to a borrowed worker
    pub fn record_offload(&self) {
        self.offloaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a subdirectory searched synchronously because no worker was idle
    pub fn record_inline(&self) {
        self.inline.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a large directory split between a frame and a borrowed worker
    pub fn record_split(&self) {
        self.splits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a task that panicked instead of returning its stats
    pub fn record_panic(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> PoolStats {
        PoolStats {
            offloaded: self.offloaded.load(Ordering::Relaxed),
            inline: self.inline.load(Ordering::Relaxed),
            splits: self.splits.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Worker pool stats:\n\
             Subtrees offloaded: {}\n\
             Subtrees searched inline: {}\n\
             Directories split: {}\n\
             Tasks panicked: {}",
            stats.offloaded, stats.inline, stats.splits, stats.panicked
        );
    }
}

/// Snapshot of [`PoolMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub offloaded: u64,
    pub inline: u64,
    pub splits: u64,
    pub panicked: u64,
}
