//! Cheap per-entry checks that run before any file content is read.
//!
//! Everything here works on names and listing metadata only, so a file that is
//! rejected by a filter never costs an `open`.
use glob::Pattern;
use std::fmt;
use std::path::Path;

use crate::errors::{SearchError, SearchResult};

/// Compiled set of glob patterns for paths that should never be visited
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    pub fn new(patterns: &[String]) -> SearchResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    SearchError::config_error(format!("Invalid ignore pattern '{}': {}", p, e))
                })
            })
            .collect::<SearchResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Checks `path` relative to the search root against every pattern.
    ///
    /// Paths are normalised to forward slashes so patterns behave the same on
    /// every platform.
    pub fn is_ignored(&self, path: &Path, root: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        let normalized = relative.to_string_lossy().replace('\\', "/");
        self.patterns.iter().any(|p| p.matches(&normalized))
    }
}

/// Case-sensitive filename filter; an empty pattern accepts every name
pub fn name_matches(name: &str, pattern: &str) -> bool {
    pattern.is_empty() || name.contains(pattern)
}

/// Why a file was not eligible for a content search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRejection {
    TooLarge { size: u64, max_kb: u64 },
    SmallerThanQuery { size: u64, query_len: u64 },
}

impl fmt::Display for SizeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeRejection::TooLarge { size, max_kb } => {
                write!(f, "size was {} which is greater than max: {}KB", size, max_kb)
            }
            SizeRejection::SmallerThanQuery { size, query_len } => {
                write!(f, "size was {}, wanted at least {}", size, query_len)
            }
        }
    }
}

/// Checks that a file of `size` bytes could possibly contain `query` and is
/// within the `max_kb` limit. Sizes are compared in whole kilobytes, so a file
/// is only rejected once `size / 1024` exceeds the limit.
pub fn check_content_size(size: u64, query: &str, max_kb: u64) -> Result<(), SizeRejection> {
    if size / 1024 > max_kb {
        return Err(SizeRejection::TooLarge { size, max_kb });
    }
    let query_len = query.len() as u64;
    if size < query_len {
        return Err(SizeRejection::SmallerThanQuery { size, query_len });
    }
    Ok(())
}
