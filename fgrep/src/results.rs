use std::path::PathBuf;
use std::time::Duration;

use crate::metrics::PoolStats;

/// A file that satisfied the search criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatch {
    /// The path to the file
    pub path: PathBuf,
    /// Matching lines or XML nodes, in file order. Empty for name-only searches.
    /// Text lines that are not valid UTF-8 carry U+FFFD in place of the bad bytes.
    pub fragments: Vec<String>,
}

/// Counters and matches accumulated by one dispatcher frame.
///
/// Frames never share a `SearchStats`; a frame merges the stats of the frames
/// it ran synchronously, and offloaded frames hand theirs over in their
/// completion message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Every file visited, skipped or not
    pub files_total: usize,
    /// Files that could not be content searched
    pub files_skipped: usize,
    /// Files reported as matches
    pub files_matched: usize,
    pub matches: Vec<FileMatch>,
}

impl SearchStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_file(&mut self) {
        self.files_total += 1;
    }

    pub fn record_skip(&mut self) {
        self.files_skipped += 1;
    }

    pub fn add_match(&mut self, file_match: FileMatch) {
        self.files_matched += 1;
        self.matches.push(file_match);
    }

    /// Merges another frame's stats into this one
    pub fn merge(&mut self, other: SearchStats) {
        self.files_total += other.files_total;
        self.files_skipped += other.files_skipped;
        self.files_matched += other.files_matched;
        self.matches.extend(other.matches);
    }
}

/// The outcome of a complete search
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub files_total: usize,
    pub files_skipped: usize,
    pub files_matched: usize,
    /// Matches sorted by path
    pub file_matches: Vec<FileMatch>,
    pub pool_stats: PoolStats,
    pub elapsed: Duration,
}

impl SearchReport {
    pub fn new(stats: SearchStats, pool_stats: PoolStats, elapsed: Duration) -> Self {
        let mut file_matches = stats.matches;
        file_matches.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            files_total: stats.files_total,
            files_skipped: stats.files_skipped,
            files_matched: stats.files_matched,
            file_matches,
            pool_stats,
            elapsed,
        }
    }

    /// Files that were visited and not skipped
    pub fn files_searched(&self) -> usize {
        self.files_total - self.files_skipped
    }

    /// One line summary of the search
    pub fn summary(&self) -> String {
        format!(
            "Searched {}/{} files, skipped {} files. Found {} matches in {:.6} seconds",
            self.files_searched(),
            self.files_total,
            self.files_skipped,
            self.files_matched,
            self.elapsed.as_secs_f64()
        )
    }
}
