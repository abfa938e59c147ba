//! Storage Module Tests
//!
//! Validates key allocation and the proxy's caching behaviour.
//!
//! ## Test Scopes
//! - **UrlStore**: uniqueness of issued keys, custom keys, collision handling.
//! - **ProxyStore**: read-through caching and error propagation, against an
//!   in-process remote that can be switched off.
//! - **Store**: the variant dispatch used by the HTTP handlers.
//!
//! *Note: persistence is covered in `persistence::tests`, HTTP in `remote::tests`.*

#[cfg(test)]
mod tests {
    use crate::remote::{HttpRemote, RemoteStore};
    use crate::storage::{ProxyStore, Store, StoreError, StoreResult, UrlStore};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Remote backed by a real store that can be taken offline.
    struct SwitchableRemote {
        store: UrlStore,
        online: AtomicBool,
        calls: AtomicUsize,
    }

    impl SwitchableRemote {
        fn new() -> Self {
            Self {
                store: UrlStore::in_memory(),
                online: AtomicBool::new(true),
                calls: AtomicUsize::new(0),
            }
        }

        fn go_offline(&self) {
            self.online.store(false, Ordering::SeqCst);
        }

        fn check(&self) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.online.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(StoreError::RemoteUnavailable("remote switched off".to_string()))
            }
        }
    }

    impl RemoteStore for SwitchableRemote {
        async fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.check()?;
            Ok(self.store.get(key))
        }

        async fn put(&self, url: &str) -> StoreResult<String> {
            self.check()?;
            self.store.put(url).await
        }
    }

    // ============================================================
    // AUTHORITATIVE STORE
    // ============================================================

    #[tokio::test]
    async fn test_put_then_get() {
        let store = UrlStore::in_memory();

        let key = store.put("http://example.com/a").await.unwrap();

        assert_eq!(key, "0");
        assert_eq!(store.get(&key).as_deref(), Some("http://example.com/a"));
    }

    #[tokio::test]
    async fn test_sequential_keys_follow_counter() {
        let store = UrlStore::in_memory();

        let mut keys = Vec::new();
        for i in 0..63 {
            keys.push(store.put(&format!("http://example.com/{}", i)).await.unwrap());
        }

        assert_eq!(keys[0], "0");
        assert_eq!(keys[1], "1");
        assert_eq!(keys[61], "Z");
        assert_eq!(keys[62], "10");
        assert_eq!(store.next_counter().await, 63);
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = UrlStore::in_memory();
        assert!(store.get("nothing").is_none());
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected() {
        let store = UrlStore::in_memory();

        assert!(matches!(store.put("").await, Err(StoreError::EmptyUrl)));
        assert!(matches!(
            store.put_custom("k", "").await,
            Err(StoreError::EmptyUrl)
        ));
        assert!(store.is_empty());
        assert_eq!(store.next_counter().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_issue_distinct_keys() {
        let store = Arc::new(UrlStore::in_memory());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut keys = Vec::new();
                    for i in 0..250 {
                        let url = format!("http://example.com/{}/{}", worker, i);
                        keys.push((store.put(&url).await.unwrap(), url));
                    }
                    keys
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for (key, url) in handle.await.unwrap() {
                assert!(seen.insert(key.clone()), "key {} issued twice", key);
                assert_eq!(UrlStore::get(&store, &key), Some(url));
            }
        }

        assert_eq!(seen.len(), 2000);
        assert_eq!(store.len(), 2000);
    }

    #[tokio::test]
    async fn test_custom_key_conflict_keeps_first_url() {
        let store = UrlStore::in_memory();

        store.put_custom("go", "http://first.example").await.unwrap();
        let second = store.put_custom("go", "http://second.example").await;

        assert!(matches!(second, Err(StoreError::KeyConflict(ref k)) if k == "go"));
        assert_eq!(store.get("go").as_deref(), Some("http://first.example"));
    }

    #[tokio::test]
    async fn test_put_skips_keys_taken_by_custom_inserts() {
        let store = UrlStore::in_memory();
        store.put_custom("0", "http://custom.example/0").await.unwrap();
        store.put_custom("1", "http://custom.example/1").await.unwrap();

        let key = store.put("http://generated.example").await.unwrap();

        assert_eq!(key, "2");
        assert_eq!(store.get("0").as_deref(), Some("http://custom.example/0"));
        // Colliding attempts still consume counter values.
        assert_eq!(store.next_counter().await, 3);
    }

    // ============================================================
    // PROXY STORE
    // ============================================================

    #[tokio::test]
    async fn test_proxy_miss_fills_cache() {
        // ARRANGE: the remote knows "abc", the proxy knows nothing
        let remote = Arc::new(SwitchableRemote::new());
        remote
            .store
            .put_custom("abc", "http://example.com")
            .await
            .unwrap();
        let proxy = ProxyStore::new(remote.clone());

        // ACT: first lookup goes remote
        let first = proxy.get("abc").await.unwrap();

        // ASSERT: second lookup is served with the remote switched off
        assert_eq!(first.as_deref(), Some("http://example.com"));
        remote.go_offline();
        let second = proxy.get("abc").await.unwrap();
        assert_eq!(second.as_deref(), Some("http://example.com"));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_proxy_remote_miss_is_not_cached() {
        let remote = Arc::new(SwitchableRemote::new());
        let proxy = ProxyStore::new(remote.clone());

        assert_eq!(proxy.get("later").await.unwrap(), None);

        remote
            .store
            .put_custom("later", "http://later.example")
            .await
            .unwrap();
        assert_eq!(
            proxy.get("later").await.unwrap().as_deref(),
            Some("http://later.example")
        );
        assert_eq!(proxy.cached_len(), 1);
    }

    #[tokio::test]
    async fn test_proxy_miss_with_remote_down_is_an_error() {
        let remote = Arc::new(SwitchableRemote::new());
        remote.go_offline();
        let proxy = ProxyStore::new(remote);

        let result = proxy.get("abc").await;

        assert!(matches!(result, Err(StoreError::RemoteUnavailable(_))));
    }

    #[tokio::test]
    async fn test_proxy_put_goes_remote_and_caches() {
        let remote = Arc::new(SwitchableRemote::new());
        let proxy = ProxyStore::new(remote.clone());

        let key = proxy.put("http://example.com/new").await.unwrap();

        assert_eq!(remote.store.get(&key).as_deref(), Some("http://example.com/new"));
        remote.go_offline();
        assert_eq!(
            proxy.get(&key).await.unwrap().as_deref(),
            Some("http://example.com/new")
        );
    }

    #[tokio::test]
    async fn test_proxy_put_with_remote_down_fails_without_caching() {
        let remote = Arc::new(SwitchableRemote::new());
        remote.go_offline();
        let proxy = ProxyStore::new(remote.clone());

        let result = proxy.put("http://example.com/lost").await;

        assert!(matches!(result, Err(StoreError::RemoteUnavailable(_))));
        assert_eq!(proxy.cached_len(), 0);
        assert!(remote.store.is_empty());
    }

    #[tokio::test]
    async fn test_proxy_over_in_process_store() {
        let master = Arc::new(UrlStore::in_memory());
        let proxy = ProxyStore::new(master.clone());

        let key = proxy.put("http://example.com/direct").await.unwrap();

        assert_eq!(
            UrlStore::get(&master, &key).as_deref(),
            Some("http://example.com/direct")
        );
        assert_eq!(master.len(), 1);
    }

    // ============================================================
    // STORE DISPATCH
    // ============================================================

    #[tokio::test]
    async fn test_store_resolve_reports_not_found() {
        let store = Store::Authoritative(UrlStore::in_memory());
        let key = store.put("http://example.com").await.unwrap();

        assert_eq!(store.resolve(&key).await.unwrap(), "http://example.com");
        assert!(matches!(
            store.resolve("missing").await,
            Err(StoreError::KeyNotFound(_))
        ));
        assert_eq!(store.role(), "authoritative");
    }

    #[tokio::test]
    async fn test_proxy_rejects_custom_keys() {
        let store = Store::Proxy(ProxyStore::new(HttpRemote::new(
            "127.0.0.1:9",
            Duration::from_millis(100),
        )));

        let result = store.put_custom("go", "http://example.com").await;

        assert!(matches!(result, Err(StoreError::Unsupported(_))));
        assert_eq!(store.role(), "proxy");
        assert!(store.is_empty());
    }
}
