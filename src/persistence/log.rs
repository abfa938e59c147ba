use super::PersistenceError;
use crate::storage::table::UrlTable;

use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufWriter};

/// One insert, as written to the append log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub url: String,
}

/// An append-only JSON-lines log of records.
#[derive(Debug, Clone)]
pub struct AppendLog {
    path: PathBuf,
}

impl AppendLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replays the log into `table` and returns the number of records read.
    ///
    /// Lines that do not parse (typically a record torn by a crash) are
    /// skipped with a warning.
    pub async fn replay_into(&self, table: &UrlTable) -> Result<u64, PersistenceError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No log at {}, starting empty", self.path.display());
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let mut count = 0u64;
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = match serde_json::from_str(line) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(
                        "Skipping line {} of {}: {}",
                        line_no + 1,
                        self.path.display(),
                        e
                    );
                    continue;
                }
            };
            if !table.set(&record.key, &record.url) {
                tracing::warn!("Duplicate key {} in log, keeping first", record.key);
            }
            count += 1;
        }

        tracing::info!("Replayed {} records from {}", count, self.path.display());
        Ok(count)
    }

    /// Opens the log for appending. A torn final line is terminated first so
    /// that new records start on a line of their own.
    pub(crate) async fn open_writer(&self) -> Result<LogWriter, PersistenceError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await?;

        let len = file.metadata().await?.len();
        if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::Start(len - 1)).await?;
            file.read_exact(&mut last).await?;
            if last[0] != b'\n' {
                file.write_all(b"\n").await?;
            }
        }

        Ok(LogWriter {
            inner: BufWriter::new(file),
            unflushed: 0,
        })
    }
}

pub(crate) struct LogWriter {
    inner: BufWriter<tokio::fs::File>,
    unflushed: usize,
}

impl LogWriter {
    pub(crate) async fn append(&mut self, record: &Record) -> Result<(), PersistenceError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.inner.write_all(&line).await?;
        self.unflushed += 1;
        Ok(())
    }

    /// Flushes buffered records; returns how many were pending.
    pub(crate) async fn flush(&mut self) -> Result<usize, PersistenceError> {
        if self.unflushed == 0 {
            return Ok(0);
        }
        self.inner.flush().await?;
        self.inner.get_ref().sync_data().await?;
        Ok(std::mem::take(&mut self.unflushed))
    }
}
