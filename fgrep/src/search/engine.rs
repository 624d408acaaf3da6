use rayon::ThreadPoolBuilder;
use std::time::Instant;
use tracing::{debug, info};

use super::completion::CompletionTracker;
use super::dispatcher::{Dispatcher, SearchQuery};
use crate::config::SearchConfig;
use crate::errors::{SearchError, SearchResult};
use crate::filters::IgnoreSet;
use crate::fs::{FileSystem, LocalFs};
use crate::metrics::PoolMetrics;
use crate::pool::WorkerPool;
use crate::results::SearchReport;

/// Searches the local disk below `config.root_path`
pub fn search(config: &SearchConfig) -> SearchResult<SearchReport> {
    search_with(&LocalFs, config)
}

/// Searches `fs` below `config.root_path`.
///
/// The root is listed and searched on the calling thread. Subdirectories and
/// the second half of large directories are handed to idle workers, of which
/// there are `config.worker_count`; when none is idle the caller searches them
/// itself. Returns once every offloaded task has reported back.
///
/// Only a root that can not be listed fails the search. Unreadable
/// subdirectories are logged and skipped, unreadable or unsearchable files
/// are counted as skipped.
pub fn search_with<F: FileSystem>(fs: &F, config: &SearchConfig) -> SearchResult<SearchReport> {
    config.validate()?;
    let Some(root) = config.root_path.clone() else {
        return Err(SearchError::config_error("No directory specified"));
    };

    info!(
        "Searching {} for file names containing '{}' with content '{}', up to {}KB",
        root.display(),
        config.file_pattern,
        config.content_pattern,
        config.max_file_size_kb
    );

    let query = SearchQuery {
        root,
        file_pattern: config.file_pattern.clone(),
        content_pattern: config.content_pattern.clone(),
        max_file_size_kb: config.max_file_size_kb,
        ignore: IgnoreSet::new(&config.ignore_patterns)?,
    };
    if !query.ignore.is_empty() {
        debug!("Ignoring paths matching {:?}", config.ignore_patterns);
    }

    let start = Instant::now();
    let entries = fs
        .list_dir(&query.root)
        .map_err(|e| SearchError::directory_listing(&query.root, e))?;

    // Offloaded tasks are capped by the worker tokens, so one thread per
    // worker is enough for them never to queue behind each other.
    let runtime = ThreadPoolBuilder::new()
        .num_threads(config.worker_count.max(1))
        .thread_name(|i| format!("fgrep-worker-{}", i))
        .build()
        .map_err(|e| SearchError::thread_pool(e.to_string()))?;

    let pool = WorkerPool::with_workers(config.worker_count);
    let tracker = CompletionTracker::new();
    let metrics = PoolMetrics::new();
    let dispatcher = Dispatcher::new(fs, &query, &pool, &tracker, &metrics);

    let stats = runtime.in_place_scope(|scope| {
        let stats = dispatcher.search_dir(scope, &query.root, entries, "main");
        debug!(
            "[main]: finished, waiting for {} outstanding tasks",
            tracker.outstanding()
        );
        tracker.wait(stats, &metrics)
    });

    metrics.log_stats();
    let report = SearchReport::new(stats, metrics.get_stats(), start.elapsed());
    info!("{}", report.summary());
    Ok(report)
}
