use super::{PersistenceError, sibling_path};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Counter values reserved per lease extension.
pub const LEASE_BLOCK: u64 = 1024;

/// A persisted upper bound on every counter value that may have been issued.
///
/// The allocator extends the lease *before* it hands out a value at or above
/// the bound, so after a crash the store can resume allocation at the bound
/// without reusing a key that reached a client but not the snapshot.
#[derive(Debug)]
pub struct CounterLease {
    path: PathBuf,
    reserved: u64,
}

impl CounterLease {
    /// Lease file that belongs to the data file at `data_path`.
    pub fn path_for(data_path: &Path) -> PathBuf {
        sibling_path(data_path, ".counter")
    }

    /// Reads the lease; a missing or unreadable file counts as nothing reserved.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let reserved = match tokio::fs::read_to_string(&path).await {
            Ok(text) => match text.trim().parse::<u64>() {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable counter lease {}: {}", path.display(), e);
                    0
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => {
                tracing::warn!("Ignoring counter lease {}: {}", path.display(), e);
                0
            }
        };
        Self { path, reserved }
    }

    /// First counter value not covered by the lease.
    pub fn reserved(&self) -> u64 {
        self.reserved
    }

    /// Makes sure `value` is covered, extending the lease by a block if not.
    ///
    /// On a write failure the in-memory bound still advances, so a broken
    /// disk costs one failed write per block rather than one per insert.
    /// The write goes through `tokio::fs`, which runs it on the blocking pool.
    pub async fn cover(&mut self, value: u64) -> Result<(), PersistenceError> {
        if value < self.reserved {
            return Ok(());
        }
        let bound = value.saturating_add(LEASE_BLOCK);
        self.reserved = bound;
        self.write(bound).await
    }

    async fn write(&self, bound: u64) -> Result<(), PersistenceError> {
        let tmp = sibling_path(&self.path, ".tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(format!("{}\n", bound).as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
