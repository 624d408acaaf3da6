//! Error types for fgrep.
//!
//! Almost nothing that goes wrong during a search is fatal. A file that cannot
//! be read, a subdirectory that cannot be listed or content that cannot be
//! scanned all degrade to "this part of the tree contributes nothing" and only
//! show up in the skipped counter and the debug log. The variants below are the
//! failures that do reach a caller:
//!
//! ```rust,ignore
//! match fgrep::search(&config) {
//!     Ok(report) => println!("{} matches", report.files_matched),
//!     Err(SearchError::DirectoryListing { path, .. }) => // root is unreadable,
//!     Err(SearchError::ConfigError(msg)) => // nothing to search for,
//!     Err(e) => // anything else
//! }
//! ```
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Failed to read directory {path}: {source}")]
    DirectoryListing {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Worker pool is full ({capacity} workers), worker {worker_id} was rejected")]
    PoolFull { capacity: usize, worker_id: usize },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SearchError {
    pub fn directory_listing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryListing {
            path: path.into(),
            source,
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn pool_full(capacity: usize, worker_id: usize) -> Self {
        Self::PoolFull {
            capacity,
            worker_id,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn thread_pool(msg: impl Into<String>) -> Self {
        Self::ThreadPool(msg.into())
    }

    /// Maps an io error from reading `path` onto the matching variant
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}
