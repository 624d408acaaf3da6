//! Concurrent directory search.
//!
//! A search starts with one frame on the calling thread. Whenever a frame
//! meets a subdirectory it tries to borrow a [`Worker`](crate::worker::Worker)
//! from the [`WorkerPool`](crate::pool::WorkerPool): with one it launches the
//! subtree as a separate task, without one it descends itself. The pool size
//! therefore caps how many subtrees are searched at the same time, and the
//! search never waits for a worker to become free.
//!
//! Every launched task reports exactly once to the
//! [`CompletionTracker`](completion::CompletionTracker), and [`search`]
//! returns only once the tracker has heard from all of them.

pub mod completion;
pub mod dispatcher;
pub mod engine;

pub use completion::{Completion, CompletionTracker};
pub use dispatcher::{Dispatcher, SearchQuery, SPLIT_THRESHOLD};
pub use engine::{search, search_with};
