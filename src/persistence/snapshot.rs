use super::{PersistenceError, sibling_path};
use crate::storage::table::UrlTable;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// A full-table snapshot file that is replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the snapshot into `table` and returns the counter saved with it.
    ///
    /// A missing or empty file is a fresh store (counter 0). A file that does
    /// not parse is moved aside to `<path>.corrupt` before the error is
    /// returned, so the next save cannot overwrite the only copy.
    pub async fn load_into(&self, table: &UrlTable) -> Result<u64, PersistenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No snapshot at {}, starting empty", self.path.display());
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(0);
        }

        match table.read_snapshot(bytes.as_slice()) {
            Ok(counter) => {
                tracing::info!(
                    "Loaded {} records from {} (counter {})",
                    table.len(),
                    self.path.display(),
                    counter
                );
                Ok(counter)
            }
            Err(e) => {
                let aside = sibling_path(&self.path, ".corrupt");
                if let Err(rename_err) = tokio::fs::rename(&self.path, &aside).await {
                    tracing::warn!(
                        "Could not move unreadable snapshot aside: {}",
                        rename_err
                    );
                } else {
                    tracing::warn!("Moved unreadable snapshot to {}", aside.display());
                }
                Err(e.into())
            }
        }
    }

    /// Writes `bytes` to `<path>.tmp`, syncs it, then renames it over the
    /// snapshot.
    pub async fn save(&self, bytes: &[u8]) -> Result<(), PersistenceError> {
        let tmp = sibling_path(&self.path, ".tmp");

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
