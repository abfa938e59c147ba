//! URL Storage Module
//!
//! Holds the key space of the service and the two ways of serving it.
//!
//! ## Core Concepts
//! - **Keys**: base-62 renderings of a monotonically increasing counter (`keygen`).
//! - **Table**: an insert-only concurrent map from key to URL (`table`).
//! - **Authoritative store**: owns the counter and the durable table; every key
//!   in the system is allocated here (`authoritative`).
//! - **Proxy store**: a read-through cache in front of a remote authoritative
//!   store, for instances without durable state (`proxy`).
//! - **Store**: the configured variant, as seen by the HTTP handlers (`service`).

pub mod authoritative;
pub mod error;
pub mod handlers;
pub mod keygen;
pub mod proxy;
pub mod service;
pub mod table;

#[cfg(test)]
mod tests;

pub use authoritative::{StoreOptions, UrlStore};
pub use error::{StoreError, StoreResult};
pub use keygen::gen_key;
pub use proxy::ProxyStore;
pub use service::Store;
pub use table::UrlTable;
