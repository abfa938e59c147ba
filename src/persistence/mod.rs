//! Durable State Module
//!
//! Keeps the authoritative table on disk without putting disk latency on the
//! insert path. Inserts hand a notification to a background worker over a
//! bounded queue and return immediately; the worker decides when to touch the
//! disk.
//!
//! ## Policies
//! - **Snapshot** (default): a dirty signal opens a debounce window; every signal
//!   that arrives inside the window is coalesced, and one full-table snapshot is
//!   written when it closes. At most one window of inserts is lost on a crash.
//! - **AppendLog**: every insert is appended as one JSON line to a buffered
//!   writer that is flushed on a fixed tick. Loading replays the whole log. The
//!   log is never compacted, so it grows with every insert ever made.
//!
//! ## Counter Lease
//! Independently of the policy, the allocator reserves counter values in blocks
//! and records the bound in a sidecar file before issuing keys from a block, so
//! keys lost in the crash window are never issued a second time.

pub mod lease;
pub mod log;
pub mod manager;
pub mod snapshot;


use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub use lease::CounterLease;
pub use log::{AppendLog, Record};
pub use manager::{PersistStats, Persister, SnapshotSource};
pub use snapshot::SnapshotFile;

/// Capacity of the queue between inserts and the persistence worker.
pub const SAVE_QUEUE_LENGTH: usize = 1000;

/// Default debounce window / log flush tick.
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /// Coalesce inserts for `debounce`, then write one full snapshot.
    Snapshot { debounce: Duration },
    /// Append each insert to a log, flushing the buffer every `flush_interval`.
    AppendLog { flush_interval: Duration },
}

impl Default for SavePolicy {
    fn default() -> Self {
        SavePolicy::Snapshot {
            debounce: DEFAULT_SAVE_INTERVAL,
        }
    }
}

/// Durable state could not be read or written.
///
/// Never fatal: the store keeps serving from memory and the failure is logged.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("persistence I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode or decode persisted state: {0}")]
    Encode(#[from] serde_json::Error),

    /// The data file could not be opened; the worker keeps running without it.
    #[error("persistence target unavailable: {0}")]
    Unavailable(String),

    #[error("persistence worker has stopped")]
    Closed,
}

/// `<path><suffix>`, e.g. `store.json` + `.tmp` → `store.json.tmp`.
pub(crate) fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
