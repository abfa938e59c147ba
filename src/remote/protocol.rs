//! Remote Store Protocol
//!
//! Endpoints and Data Transfer Objects used by proxy instances to reach the
//! authoritative store. Bodies are JSON over HTTP.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Lookup of a single key on the authoritative store.
pub const ENDPOINT_RPC_GET: &str = "/rpc/get";
/// Insert of a URL under a freshly allocated key.
pub const ENDPOINT_RPC_PUT: &str = "/rpc/put";

// --- Data Transfer Objects ---

/// Lookup request. The key travels in the body so that custom keys need no
/// path escaping.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetRequest {
    pub key: String,
}

/// Lookup result.
///
/// Sent with `200 OK` when the key exists and `404 Not Found` (with `url: None`)
/// when it does not, so a miss is never confused with a transport failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub url: Option<String>,
}

/// Insert request.
#[derive(Debug, Serialize, Deserialize)]
pub struct PutRequest {
    pub url: String,
}

/// Insert result: the issued key on success, an explanation otherwise.
#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
