//! Concurrent file search over a bounded pool of reusable workers.
//!
//! ```rust,no_run
//! use fgrep::{search, SearchConfig};
//! use std::path::PathBuf;
//!
//! let config = SearchConfig {
//!     root_path: Some(PathBuf::from("/var/log")),
//!     file_pattern: ".log".to_string(),
//!     content_pattern: "timeout".to_string(),
//!     ..SearchConfig::default()
//! };
//!
//! let report = search(&config)?;
//! for file_match in &report.file_matches {
//!     println!("{}", file_match.path.display());
//! }
//! println!("{}", report.summary());
//! # Ok::<(), fgrep::SearchError>(())
//! ```
pub mod config;
pub mod errors;
pub mod filters;
pub mod fs;
pub mod metrics;
pub mod pool;
pub mod results;
pub mod scanner;
pub mod search;
pub mod worker;

pub use config::SearchConfig;
pub use errors::{SearchError, SearchResult};
pub use fs::{DirEntry, FileSystem, LocalFs};
pub use metrics::PoolStats;
pub use pool::WorkerPool;
pub use results::{FileMatch, SearchReport, SearchStats};
pub use scanner::ScanError;
pub use search::{search, search_with};
pub use worker::{Worker, WorkerStatus};
