//! Short Link Service Library
//!
//! Maps long URLs to short keys and back. One node is authoritative: it
//! allocates every key and keeps the table on disk. Any number of proxy nodes
//! can sit in front of it, answering lookups from a local cache and forwarding
//! all writes.
//!
//! ## Modules
//! - **`storage`**: key generation, the concurrent table, the authoritative and
//!   proxy stores, and the public HTTP handlers.
//! - **`persistence`**: snapshot and append-log persistence, driven by a
//!   background worker, plus the counter lease that keeps keys unique across
//!   crashes.
//! - **`remote`**: the Get/Put channel between proxies and the authoritative node.
//! - **`config`**: command-line flags.
//! - **`server`**: the axum router and background reporters.

pub mod config;
pub mod persistence;
pub mod remote;
pub mod server;
pub mod storage;
