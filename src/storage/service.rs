use super::authoritative::UrlStore;
use super::error::{StoreError, StoreResult};
use super::proxy::ProxyStore;
use crate::persistence::PersistenceError;
use crate::remote::HttpRemote;

/// The store a service instance runs with, built once at startup and shared
/// with every handler.
pub enum Store {
    Authoritative(UrlStore),
    Proxy(ProxyStore<HttpRemote>),
}

impl Store {
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self {
            Store::Authoritative(store) => Ok(store.get(key)),
            Store::Proxy(proxy) => proxy.get(key).await,
        }
    }

    /// Like `get`, but a miss is `StoreError::KeyNotFound`.
    pub async fn resolve(&self, key: &str) -> StoreResult<String> {
        self.get(key)
            .await?
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    pub async fn put(&self, url: &str) -> StoreResult<String> {
        match self {
            Store::Authoritative(store) => store.put(url).await,
            Store::Proxy(proxy) => proxy.put(url).await,
        }
    }

    /// Custom keys are only accepted by the authoritative store; the remote
    /// channel carries plain lookups and inserts only.
    pub async fn put_custom(&self, key: &str, url: &str) -> StoreResult<()> {
        match self {
            Store::Authoritative(store) => store.put_custom(key, url).await,
            Store::Proxy(_) => Err(StoreError::Unsupported("custom key insert")),
        }
    }

    /// Records held locally: the full table, or the proxy's cache.
    pub fn len(&self) -> usize {
        match self {
            Store::Authoritative(store) => store.len(),
            Store::Proxy(proxy) => proxy.cached_len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn role(&self) -> &'static str {
        match self {
            Store::Authoritative(_) => "authoritative",
            Store::Proxy(_) => "proxy",
        }
    }

    /// Forces outstanding state to disk. Proxies hold nothing durable.
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        match self {
            Store::Authoritative(store) => store.flush().await,
            Store::Proxy(_) => Ok(()),
        }
    }
}
