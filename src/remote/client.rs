use super::protocol::{
    ENDPOINT_RPC_GET, ENDPOINT_RPC_PUT, GetRequest, GetResponse, PutRequest, PutResponse,
};
use crate::storage::authoritative::UrlStore;
use crate::storage::error::{StoreError, StoreResult};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default deadline for a single remote call.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(2);

/// The two operations a proxy needs from the authoritative store.
///
/// Implementations must report an unreachable or slow peer, or one answering
/// with a server error, as `StoreError::RemoteUnavailable`, and a missing key
/// as `Ok(None)`.
pub trait RemoteStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = StoreResult<Option<String>>> + Send;
    fn put(&self, url: &str) -> impl Future<Output = StoreResult<String>> + Send;
}

impl<T: RemoteStore> RemoteStore for Arc<T> {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key).await
    }

    async fn put(&self, url: &str) -> StoreResult<String> {
        (**self).put(url).await
    }
}

/// In-process channel: a proxy talking to a store in the same process.
impl RemoteStore for UrlStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(UrlStore::get(self, key))
    }

    async fn put(&self, url: &str) -> StoreResult<String> {
        UrlStore::put(self, url).await
    }
}

/// HTTP/JSON client for the endpoints in `protocol`.
///
/// Calls are made once, with a per-request timeout; retrying is left to the
/// caller.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpRemote {
    /// `addr` is either `host:port` or a full `http://` base URL.
    pub fn new(addr: &str, timeout: Duration) -> Self {
        let cleaned = addr.trim_end_matches('/');
        let base_url = if cleaned.starts_with("http://") || cleaned.starts_with("https://") {
            cleaned.to_string()
        } else {
            format!("http://{}", cleaned)
        };

        Self {
            http_client: reqwest::Client::new(),
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: serde::Serialize>(
        &self,
        endpoint: &str,
        payload: &T,
    ) -> StoreResult<reqwest::Response> {
        self.http_client
            .post(format!("{}{}", self.base_url, endpoint))
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Remote call to {}{} failed: {}", self.base_url, endpoint, e);
                StoreError::RemoteUnavailable(e.to_string())
            })
    }
}

impl RemoteStore for HttpRemote {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let response = self
            .post(
                ENDPOINT_RPC_GET,
                &GetRequest {
                    key: key.to_string(),
                },
            )
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status.is_server_error() {
            return Err(StoreError::RemoteUnavailable(format!("GET failed with {}", status)));
        }
        if !status.is_success() {
            return Err(StoreError::Remote(format!("GET failed with {}", status)));
        }

        let body: GetResponse = response
            .json()
            .await
            .map_err(|e| StoreError::RemoteUnavailable(e.to_string()))?;
        Ok(body.url)
    }

    async fn put(&self, url: &str) -> StoreResult<String> {
        let response = self
            .post(
                ENDPOINT_RPC_PUT,
                &PutRequest {
                    url: url.to_string(),
                },
            )
            .await?;
        let status = response.status();

        if !status.is_success() {
            let reason = match response.json::<PutResponse>().await {
                Ok(PutResponse {
                    error: Some(error), ..
                }) => error,
                _ => format!("PUT failed with {}", status),
            };
            // 5xx means the far side could not serve the call, not that it
            // refused the URL.
            if status.is_server_error() {
                return Err(StoreError::RemoteUnavailable(reason));
            }
            return Err(StoreError::Remote(reason));
        }

        let body: PutResponse = response
            .json()
            .await
            .map_err(|e| StoreError::RemoteUnavailable(e.to_string()))?;
        body.key
            .ok_or_else(|| StoreError::Remote("PUT response carried no key".to_string()))
    }
}
