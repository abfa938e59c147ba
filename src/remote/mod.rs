//! Remote Call Channel
//!
//! How a proxy instance reaches the authoritative store across the network.
//!
//! - **`protocol`**: endpoint paths and JSON bodies for the two remote
//!   operations, `get` and `put`.
//! - **`client`**: the `RemoteStore` trait and its HTTP implementation.
//! - **`handlers`**: the axum handlers that serve those endpoints.
//!
//! Transport failures and timeouts surface as `StoreError::RemoteUnavailable`;
//! an absent key is an ordinary `None`.

pub mod client;
pub mod handlers;
pub mod protocol;


pub use client::{DEFAULT_RPC_TIMEOUT, HttpRemote, RemoteStore};
