use rayon::Scope;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use super::completion::CompletionTracker;
use crate::errors::SearchError;
use crate::filters::{check_content_size, name_matches, IgnoreSet};
use crate::fs::{DirEntry, FileSystem};
use crate::metrics::PoolMetrics;
use crate::pool::WorkerPool;
use crate::results::{FileMatch, SearchStats};
use crate::scanner;
use crate::worker::Worker;

/// A frame only hands part of its listing to another worker once half of it
/// is larger than this.
pub const SPLIT_THRESHOLD: usize = 45;

/// The criteria every frame of one search applies
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub root: PathBuf,
    pub file_pattern: String,
    pub content_pattern: String,
    pub max_file_size_kb: u64,
    pub ignore: IgnoreSet,
}

/// Walks directory listings, handing subtrees to idle workers and searching
/// them on the current frame when none is free.
pub struct Dispatcher<'a, F: FileSystem> {
    fs: &'a F,
    query: &'a SearchQuery,
    pool: &'a WorkerPool,
    tracker: &'a CompletionTracker,
    metrics: &'a PoolMetrics,
}

impl<F: FileSystem> Clone for Dispatcher<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: FileSystem> Copy for Dispatcher<'_, F> {}

impl<'a, F: FileSystem> Dispatcher<'a, F> {
    pub fn new(
        fs: &'a F,
        query: &'a SearchQuery,
        pool: &'a WorkerPool,
        tracker: &'a CompletionTracker,
        metrics: &'a PoolMetrics,
    ) -> Self {
        Self {
            fs,
            query,
            pool,
            tracker,
            metrics,
        }
    }

    /// Searches an already listed directory and returns what this frame saw.
    ///
    /// Work offloaded from here reports through the [`CompletionTracker`]
    /// instead of the returned stats.
    pub fn search_dir(
        &self,
        scope: &Scope<'a>,
        dir: &Path,
        mut entries: Vec<DirEntry>,
        label: &str,
    ) -> SearchStats {
        debug!(
            "[{}]: searching '{}' ({} entries)",
            label,
            dir.display(),
            entries.len()
        );

        let half = entries.len() / 2;
        if half > SPLIT_THRESHOLD {
            if let Some(worker) = self.pool.dequeue() {
                let total = entries.len();
                let tail = entries.split_off(half);
                debug!(
                    "[{}]: '{}' has {} entries, {}-{} go to worker[{}]",
                    label,
                    dir.display(),
                    total,
                    half,
                    total - 1,
                    worker.id()
                );
                self.metrics.record_split();
                self.offload(scope, worker, dir.to_path_buf(), tail);
            }
        }

        let mut stats = SearchStats::new();
        for entry in &entries {
            if self.query.ignore.is_ignored(&entry.path, &self.query.root) {
                trace!("[{}]: ignoring '{}'", label, entry.path.display());
                continue;
            }
            if entry.is_dir {
                self.visit_dir(scope, entry, label, &mut stats);
            } else {
                self.visit_file(entry, label, &mut stats);
            }
        }
        stats
    }

    fn offload(
        &self,
        scope: &Scope<'a>,
        worker: Worker,
        dir: PathBuf,
        entries: Vec<DirEntry>,
    ) {
        let dispatcher = *self;
        let label = format!("worker[{}]", worker.id());
        self.tracker.launch(scope, self.pool, worker, move |scope| {
            dispatcher.search_dir(scope, &dir, entries, &label)
        });
    }

    fn visit_dir(
        &self,
        scope: &Scope<'a>,
        entry: &DirEntry,
        label: &str,
        stats: &mut SearchStats,
    ) {
        let children = match self.fs.list_dir(&entry.path) {
            Ok(children) => children,
            Err(e) => {
                warn!("Failed to read directory {}: {}", entry.path.display(), e);
                return;
            }
        };

        match self.pool.dequeue() {
            Some(worker) => {
                debug!(
                    "[{}]: offloading '{}' to worker[{}]",
                    label,
                    entry.path.display(),
                    worker.id()
                );
                self.metrics.record_offload();
                self.offload(scope, worker, entry.path.clone(), children);
            }
            None => {
                trace!(
                    "[{}]: no idle worker, searching '{}' inline",
                    label,
                    entry.path.display()
                );
                self.metrics.record_inline();
                let child_stats = self.search_dir(scope, &entry.path, children, label);
                stats.merge(child_stats);
            }
        }
    }

    fn visit_file(&self, entry: &DirEntry, label: &str, stats: &mut SearchStats) {
        stats.record_file();
        let query = self.query;

        if !name_matches(&entry.name, &query.file_pattern) {
            return;
        }

        if query.content_pattern.is_empty() {
            stats.add_match(FileMatch {
                path: entry.path.clone(),
                fragments: Vec::new(),
            });
            return;
        }

        if let Err(reason) =
            check_content_size(entry.size, &query.content_pattern, query.max_file_size_kb)
        {
            debug!("[{}]: skipped {}, {}", label, entry.path.display(), reason);
            stats.record_skip();
            return;
        }

        let content = match self.fs.read(&entry.path) {
            Ok(content) => content,
            Err(e) => {
                let reason = SearchError::from_io(&entry.path, e);
                debug!("[{}]: skipped {}, {}", label, entry.path.display(), reason);
                stats.record_skip();
                return;
            }
        };

        match scanner::scan(entry.extension(), &content, &query.content_pattern) {
            Ok(fragments) if !fragments.is_empty() => {
                trace!(
                    "[{}]: {} fragments in {}",
                    label,
                    fragments.len(),
                    entry.path.display()
                );
                stats.add_match(FileMatch {
                    path: entry.path.clone(),
                    fragments,
                });
            }
            Ok(_) => {}
            Err(e) => {
                debug!("[{}]: skipped {}, {}", label, entry.path.display(), e);
                stats.record_skip();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;

    /// In-memory tree; directories listed in `broken` fail to list and files
    /// without content fail to read.
    #[derive(Default)]
    struct FakeFs {
        dirs: HashMap<PathBuf, Vec<DirEntry>>,
        files: HashMap<PathBuf, Vec<u8>>,
        broken: Vec<PathBuf>,
    }

    impl FakeFs {
        fn dir(&mut self, path: &str) -> &mut Self {
            let path = PathBuf::from(path);
            self.register(&path, true, 0);
            self.dirs.entry(path).or_default();
            self
        }

        fn file(&mut self, path: &str, content: &str) -> &mut Self {
            let path = PathBuf::from(path);
            self.register(&path, false, content.len() as u64);
            self.files.insert(path, content.as_bytes().to_vec());
            self
        }

        fn unreadable_file(&mut self, path: &str, size: u64) -> &mut Self {
            self.register(Path::new(path), false, size);
            self
        }

        fn broken_dir(&mut self, path: &str) -> &mut Self {
            self.register(Path::new(path), true, 0);
            self.broken.push(PathBuf::from(path));
            self
        }

        fn register(&mut self, path: &Path, is_dir: bool, size: u64) {
            if let Some(parent) = path.parent() {
                self.dirs.entry(parent.to_path_buf()).or_default().push(DirEntry {
                    path: path.to_path_buf(),
                    name: path.file_name().unwrap().to_string_lossy().into_owned(),
                    is_dir,
                    size,
                });
            }
        }
    }

    impl FileSystem for FakeFs {
        fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
            if self.broken.iter().any(|b| b == path) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            self.dirs
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }

        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    fn query(file_pattern: &str, content_pattern: &str) -> SearchQuery {
        SearchQuery {
            root: PathBuf::from("/root"),
            file_pattern: file_pattern.to_string(),
            content_pattern: content_pattern.to_string(),
            max_file_size_kb: 2000,
            ignore: IgnoreSet::default(),
        }
    }

    fn run(fs: &FakeFs, query: &SearchQuery, workers: usize) -> (SearchStats, WorkerPool) {
        let runtime = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()
            .unwrap();
        let pool = WorkerPool::with_workers(workers);
        let tracker = CompletionTracker::new();
        let metrics = PoolMetrics::new();
        let entries = fs.list_dir(&query.root).unwrap();

        let stats = {
            let dispatcher = Dispatcher::new(fs, query, &pool, &tracker, &metrics);
            runtime.in_place_scope(|scope| {
                let stats = dispatcher.search_dir(scope, &query.root, entries, "main");
                tracker.wait(stats, &metrics)
            })
        };
        (stats, pool)
    }

    fn sample_tree() -> FakeFs {
        let mut fs = FakeFs::default();
        fs.dir("/root")
            .file("/root/notes.txt", "the elephant\nthe giraffe\n")
            .file("/root/empty.txt", "")
            .dir("/root/docs")
            .file("/root/docs/animals.xml", "<zoo><animal>Elephant</animal></zoo>")
            .file("/root/docs/plain.txt", "nothing here")
            .dir("/root/docs/deep")
            .file("/root/docs/deep/elephant.md", "no match")
            .unreadable_file("/root/docs/locked.txt", 100)
            .broken_dir("/root/private");
        fs
    }

    #[test]
    fn test_counts_are_stable_across_worker_counts() {
        let fs = sample_tree();
        let query = query("", "elephant");

        for workers in [0, 1, 2, 8] {
            let (stats, pool) = run(&fs, &query, workers);
            assert_eq!(stats.files_total, 6, "workers = {}", workers);
            // empty.txt and locked.txt
            assert_eq!(stats.files_skipped, 2, "workers = {}", workers);
            assert_eq!(stats.files_matched, 2, "workers = {}", workers);
            assert_eq!(pool.len(), workers);
        }
    }

    #[test]
    fn test_content_fragments() {
        let fs = sample_tree();
        let (stats, _) = run(&fs, &query("", "elephant"), 2);

        let mut matches = stats.matches;
        matches.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(matches[0].path, PathBuf::from("/root/docs/animals.xml"));
        assert_eq!(matches[0].fragments, vec!["<animal>Elephant</animal>"]);
        assert_eq!(matches[1].path, PathBuf::from("/root/notes.txt"));
        assert_eq!(matches[1].fragments, vec!["the elephant"]);
    }

    #[test]
    fn test_name_only_search() {
        let fs = sample_tree();
        let (stats, _) = run(&fs, &query("elephant", ""), 1);

        assert_eq!(stats.files_total, 6);
        assert_eq!(stats.files_skipped, 0);
        assert_eq!(stats.files_matched, 1);
        assert!(stats.matches[0].fragments.is_empty());
    }

    #[test]
    fn test_ignored_subtree_is_not_visited() {
        let fs = sample_tree();
        let mut query = query("", "elephant");
        query.ignore = IgnoreSet::new(&["docs".to_string()]).unwrap();

        let (stats, _) = run(&fs, &query, 2);
        assert_eq!(stats.files_total, 2);
        assert_eq!(stats.files_matched, 1);
    }

    #[test]
    fn test_large_directory_is_split() {
        let mut fs = FakeFs::default();
        fs.dir("/root");
        for i in 0..120 {
            fs.file(&format!("/root/file_{:03}.txt", i), "needle\n");
        }
        let query = query("", "needle");

        let runtime = rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .unwrap();
        let pool = WorkerPool::with_workers(2);
        let tracker = CompletionTracker::new();
        let metrics = PoolMetrics::new();
        let entries = fs.list_dir(&query.root).unwrap();
        let dispatcher = Dispatcher::new(&fs, &query, &pool, &tracker, &metrics);

        let stats = runtime.in_place_scope(|scope| {
            let stats = dispatcher.search_dir(scope, &query.root, entries, "main");
            tracker.wait(stats, &metrics)
        });

        assert_eq!(stats.files_total, 120);
        assert_eq!(stats.files_matched, 120);
        assert!(metrics.get_stats().splits >= 1);
    }

    #[test]
    fn test_small_directory_is_not_split() {
        let mut fs = FakeFs::default();
        fs.dir("/root");
        for i in 0..(SPLIT_THRESHOLD * 2) {
            fs.file(&format!("/root/file_{:03}.txt", i), "needle\n");
        }
        let query = query("", "needle");

        let runtime = rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .unwrap();
        let pool = WorkerPool::with_workers(2);
        let tracker = CompletionTracker::new();
        let metrics = PoolMetrics::new();
        let entries = fs.list_dir(&query.root).unwrap();
        let dispatcher = Dispatcher::new(&fs, &query, &pool, &tracker, &metrics);

        let stats = runtime.in_place_scope(|scope| {
            let stats = dispatcher.search_dir(scope, &query.root, entries, "main");
            tracker.wait(stats, &metrics)
        });

        assert_eq!(stats.files_total, SPLIT_THRESHOLD * 2);
        assert_eq!(metrics.get_stats().splits, 0);
    }

    #[test]
    fn test_no_workers_searches_everything_inline() {
        let fs = sample_tree();
        let query = query("", "giraffe");
        let runtime = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap();
        let pool = WorkerPool::with_workers(0);
        let tracker = CompletionTracker::new();
        let metrics = PoolMetrics::new();
        let entries = fs.list_dir(&query.root).unwrap();
        let dispatcher = Dispatcher::new(&fs, &query, &pool, &tracker, &metrics);

        let stats = runtime.in_place_scope(|scope| {
            let stats = dispatcher.search_dir(scope, &query.root, entries, "main");
            assert_eq!(tracker.outstanding(), 0);
            stats
        });

        assert_eq!(stats.files_matched, 1);
        let pool_stats = metrics.get_stats();
        assert_eq!(pool_stats.offloaded, 0);
        assert_eq!(pool_stats.inline, 2);
    }
}
