//! The in-memory key → URL table.
//!
//! Backed by a sharded `DashMap`, so lookups of different keys never contend and
//! a lookup only waits for a writer touching the same shard. Records are
//! insert-only: `set` never overwrites an existing key.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};

/// Snapshot format version written into every table dump.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Self-describing on-disk form of a table.
///
/// `counter` is the allocation counter at the moment the copy was taken; plain
/// caches that own no counter write `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub version: u32,
    pub counter: u64,
    pub entries: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct UrlTable {
    urls: DashMap<String, String>,
}

impl UrlTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `key` to `url` unless the key is already present.
    ///
    /// Returns `false`, leaving the table untouched, on collision.
    pub fn set(&self, key: &str, url: &str) -> bool {
        match self.urls.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(url.to_string());
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.urls.get(key).map(|url| url.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.urls.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Copies every record out of the table.
    ///
    /// The copy is consistent only if writers are excluded for its duration;
    /// `UrlStore` guarantees that by holding its allocation lock.
    pub fn entries(&self) -> HashMap<String, String> {
        self.urls
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Adds every record of `entries` that does not collide with an existing
    /// key. Returns how many were inserted.
    pub fn extend(&self, entries: impl IntoIterator<Item = (String, String)>) -> usize {
        let mut inserted = 0;
        for (key, url) in entries {
            if let Entry::Vacant(slot) = self.urls.entry(key) {
                slot.insert(url);
                inserted += 1;
            }
        }
        inserted
    }

    /// Serializes the whole table as a single JSON document.
    pub fn write_snapshot<W: Write>(&self, counter: u64, sink: W) -> serde_json::Result<()> {
        let snapshot = TableSnapshot {
            version: SNAPSHOT_VERSION,
            counter,
            entries: self.entries(),
        };
        serde_json::to_writer(sink, &snapshot)
    }

    /// Loads a document written by `write_snapshot` into this table and
    /// returns the counter stored alongside it.
    ///
    /// Documents of another format version are rejected without touching the
    /// table.
    pub fn read_snapshot<R: Read>(&self, source: R) -> serde_json::Result<u64> {
        let snapshot: TableSnapshot = serde_json::from_reader(source)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(serde::de::Error::custom(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        self.extend(snapshot.entries);
        Ok(snapshot.counter)
    }
}
