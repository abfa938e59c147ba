//! Read-through caching proxy.
//!
//! A proxy instance owns no durable state. Lookups are served from a local
//! cache filled from the authoritative store on demand; writes always go to the
//! authoritative store and are cached only after it has accepted them.
//!
//! The cache is never evicted: its size is bounded by the keys this instance
//! has actually seen. Concurrent misses on the same key may each call the
//! remote; that is harmless because remote lookups are idempotent.

use super::error::{StoreError, StoreResult};
use super::table::UrlTable;
use crate::remote::RemoteStore;

pub struct ProxyStore<R> {
    cache: UrlTable,
    remote: R,
}

impl<R: RemoteStore> ProxyStore<R> {
    pub fn new(remote: R) -> Self {
        Self {
            cache: UrlTable::new(),
            remote,
        }
    }

    /// Looks `key` up locally, falling back to the remote store on a miss.
    ///
    /// A remote failure is returned as an error, never as "not found".
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if let Some(url) = self.cache.get(key) {
            tracing::trace!("Proxy cache hit for {}", key);
            return Ok(Some(url));
        }

        match self.remote.get(key).await? {
            Some(url) => {
                self.cache.set(key, &url);
                tracing::debug!("Proxy cached {} from remote", key);
                Ok(Some(url))
            }
            None => Ok(None),
        }
    }

    /// Inserts through the remote store and caches the issued key.
    pub async fn put(&self, url: &str) -> StoreResult<String> {
        if url.is_empty() {
            return Err(StoreError::EmptyUrl);
        }

        let key = self.remote.put(url).await?;
        self.cache.set(&key, url);
        Ok(key)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }
}
