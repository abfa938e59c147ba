//! The authoritative store: the single owner of the allocation counter and of
//! the durable key space.

use super::error::{StoreError, StoreResult};
use super::keygen::gen_key;
use super::table::UrlTable;
use crate::persistence::{
    AppendLog, CounterLease, PersistStats, PersistenceError, Persister, Record, SavePolicy,
    SnapshotFile, SnapshotSource,
};

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// How an authoritative store keeps its state.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Data file; `None` keeps everything in memory.
    pub path: Option<PathBuf>,
    pub policy: SavePolicy,
}

/// State guarded by the allocation lock.
#[derive(Debug)]
struct Allocator {
    next: u64,
    lease: Option<CounterLease>,
}

impl Allocator {
    /// Takes the next counter value, extending the lease first if needed.
    ///
    /// The counter never wraps: once it cannot move past `value` the store
    /// stops issuing generated keys.
    async fn advance(&mut self) -> StoreResult<u64> {
        let value = self.next;
        let Some(following) = value.checked_add(1) else {
            return Err(StoreError::KeySpaceExhausted(value));
        };
        if let Some(lease) = self.lease.as_mut()
            && let Err(e) = lease.cover(value).await
        {
            tracing::error!("Failed to extend counter lease: {}", e);
        }
        self.next = following;
        Ok(value)
    }
}

/// The counter and the table, shared with the persistence worker.
///
/// Lock order: `alloc` first, then the table's shard locks. Every write to the
/// table happens under `alloc`, which is what makes a snapshot copy taken
/// under `alloc` consistent.
#[derive(Debug)]
struct KeySpace {
    alloc: Mutex<Allocator>,
    table: UrlTable,
}

impl SnapshotSource for KeySpace {
    async fn snapshot_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        let alloc = self.alloc.lock().await;
        let mut buf = Vec::with_capacity(self.table.len() * 64);
        self.table.write_snapshot(alloc.next, &mut buf)?;
        Ok(buf)
    }
}

pub struct UrlStore {
    keys: Arc<KeySpace>,
    persister: Option<Persister>,
}

impl UrlStore {
    /// A store with no durable state.
    pub fn in_memory() -> Self {
        Self {
            keys: Arc::new(KeySpace {
                alloc: Mutex::new(Allocator {
                    next: 0,
                    lease: None,
                }),
                table: UrlTable::new(),
            }),
            persister: None,
        }
    }

    /// Loads the store from disk and starts its persistence worker.
    ///
    /// Never fails: unreadable state is logged and the store starts empty.
    /// Must be called inside a Tokio runtime.
    pub async fn open(options: StoreOptions) -> Self {
        let Some(path) = options.path else {
            return Self::in_memory();
        };

        let table = UrlTable::new();
        let loaded = match options.policy {
            SavePolicy::Snapshot { .. } => SnapshotFile::new(&path).load_into(&table).await,
            SavePolicy::AppendLog { .. } => AppendLog::new(&path).replay_into(&table).await,
        };
        let counter = match loaded {
            Ok(counter) => counter,
            Err(e) => {
                tracing::error!("Failed to load {}: {}; starting empty", path.display(), e);
                0
            }
        };

        let lease = CounterLease::load(CounterLease::path_for(&path)).await;
        let next = counter.max(lease.reserved()).max(table.len() as u64);
        tracing::info!(
            "Store at {} holds {} records, next counter {}",
            path.display(),
            table.len(),
            next
        );

        let keys = Arc::new(KeySpace {
            alloc: Mutex::new(Allocator {
                next,
                lease: Some(lease),
            }),
            table,
        });
        let persister = Persister::spawn(options.policy, path, keys.clone());

        Self {
            keys,
            persister: Some(persister),
        }
    }

    /// Stores `url` under a freshly allocated key and returns the key.
    ///
    /// Returns as soon as the table holds the record; durability follows
    /// according to the save policy.
    pub async fn put(&self, url: &str) -> StoreResult<String> {
        if url.is_empty() {
            return Err(StoreError::EmptyUrl);
        }

        let key = {
            let mut alloc = self.keys.alloc.lock().await;
            loop {
                let key = gen_key(alloc.advance().await?);
                if self.keys.table.set(&key, url) {
                    break key;
                }
                tracing::debug!("Key {} already bound, advancing counter", key);
            }
        };

        self.saved(&key, url).await;
        Ok(key)
    }

    /// Stores `url` under a caller-chosen key.
    pub async fn put_custom(&self, key: &str, url: &str) -> StoreResult<()> {
        if url.is_empty() {
            return Err(StoreError::EmptyUrl);
        }

        let inserted = {
            let _alloc = self.keys.alloc.lock().await;
            self.keys.table.set(key, url)
        };
        if !inserted {
            return Err(StoreError::KeyConflict(key.to_string()));
        }

        self.saved(key, url).await;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.keys.table.get(key)
    }

    pub fn len(&self) -> usize {
        self.keys.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.table.is_empty()
    }

    /// The counter value the next allocation will start from.
    pub async fn next_counter(&self) -> u64 {
        self.keys.alloc.lock().await.next
    }

    pub fn persist_stats(&self) -> Option<Arc<PersistStats>> {
        self.persister.as_ref().map(Persister::stats)
    }

    /// Writes all outstanding state now. A no-op for in-memory stores.
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        match &self.persister {
            Some(persister) => persister.flush().await,
            None => Ok(()),
        }
    }

    /// Stops the persistence worker after its final write.
    pub async fn shutdown(self) {
        if let Some(persister) = self.persister {
            persister.shutdown().await;
        }
    }

    async fn saved(&self, key: &str, url: &str) {
        if let Some(persister) = &self.persister {
            persister
                .record_saved(Record {
                    key: key.to_string(),
                    url: url.to_string(),
                })
                .await;
        }
    }
}
