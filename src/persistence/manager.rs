//! Persistence Worker
//!
//! One background task per authoritative store. It owns the file handles and is
//! the only writer of the data file, so saves never race each other.

use super::log::{AppendLog, LogWriter, Record};
use super::snapshot::SnapshotFile;
use super::{PersistenceError, SAVE_QUEUE_LENGTH, SavePolicy};

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Produces the bytes of a consistent full-table snapshot.
pub trait SnapshotSource: Send + Sync + 'static {
    fn snapshot_bytes(&self) -> impl Future<Output = Result<Vec<u8>, PersistenceError>> + Send;
}

enum SaveEvent {
    /// Something changed; a snapshot is owed.
    Dirty,
    /// A record to append to the log.
    Append(Record),
    /// Write everything now and report the outcome.
    Flush(oneshot::Sender<Result<(), PersistenceError>>),
}

/// Counters exposed for logging and tests.
#[derive(Debug, Default)]
pub struct PersistStats {
    snapshots_written: AtomicU64,
    records_flushed: AtomicU64,
    failures: AtomicU64,
}

impl PersistStats {
    pub fn snapshots_written(&self) -> u64 {
        self.snapshots_written.load(Ordering::Relaxed)
    }

    pub fn records_flushed(&self) -> u64 {
        self.records_flushed.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Handle to the persistence worker.
///
/// Dropping the handle closes the queue; the worker then writes whatever is
/// still owed and exits.
pub struct Persister {
    tx: mpsc::Sender<SaveEvent>,
    policy: SavePolicy,
    stats: Arc<PersistStats>,
    worker: JoinHandle<()>,
}

impl Persister {
    pub fn spawn<S: SnapshotSource>(policy: SavePolicy, path: PathBuf, source: Arc<S>) -> Self {
        let (tx, rx) = mpsc::channel(SAVE_QUEUE_LENGTH);
        let stats = Arc::new(PersistStats::default());

        let worker = match policy {
            SavePolicy::Snapshot { debounce } => {
                let file = SnapshotFile::new(path);
                let stats = stats.clone();
                tokio::spawn(async move {
                    snapshot_loop(rx, file, source, debounce, stats).await;
                })
            }
            SavePolicy::AppendLog { flush_interval } => {
                let log = AppendLog::new(path);
                let stats = stats.clone();
                tokio::spawn(async move {
                    log_loop(rx, log, flush_interval, stats).await;
                })
            }
        };

        tracing::info!("Persistence worker started ({:?})", policy);

        Self {
            tx,
            policy,
            stats,
            worker,
        }
    }

    pub fn policy(&self) -> SavePolicy {
        self.policy
    }

    pub fn stats(&self) -> Arc<PersistStats> {
        self.stats.clone()
    }

    /// Tells the worker that `record` was committed to the table.
    ///
    /// Under the snapshot policy this never waits: a full queue already holds
    /// a pending dirty signal. Under the log policy the record itself must not
    /// be dropped, so a full queue applies backpressure.
    pub async fn record_saved(&self, record: Record) {
        match self.policy {
            SavePolicy::Snapshot { .. } => match self.tx.try_send(SaveEvent::Dirty) {
                Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!("Persistence worker gone, insert will not be saved");
                }
            },
            SavePolicy::AppendLog { .. } => {
                if self.tx.send(SaveEvent::Append(record)).await.is_err() {
                    tracing::warn!("Persistence worker gone, insert will not be saved");
                }
            }
        }
    }

    /// Forces an immediate write and waits for it to reach the disk.
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        let (reply, done) = oneshot::channel();
        self.tx
            .send(SaveEvent::Flush(reply))
            .await
            .map_err(|_| PersistenceError::Closed)?;
        done.await.map_err(|_| PersistenceError::Closed)?
    }

    /// Closes the queue and waits for the final write.
    pub async fn shutdown(self) {
        let Self { tx, worker, .. } = self;
        drop(tx);
        if let Err(e) = worker.await {
            tracing::error!("Persistence worker panicked: {}", e);
        }
    }
}

async fn snapshot_loop<S: SnapshotSource>(
    mut rx: mpsc::Receiver<SaveEvent>,
    file: SnapshotFile,
    source: Arc<S>,
    debounce: Duration,
    stats: Arc<PersistStats>,
) {
    while let Some(event) = rx.recv().await {
        let mut reply = None;
        let mut closed = false;

        match event {
            SaveEvent::Flush(tx) => reply = Some(tx),
            SaveEvent::Dirty | SaveEvent::Append(_) => {
                // Debounce window: swallow further signals until the timer
                // fires, an explicit flush arrives, or the queue closes.
                let window = tokio::time::sleep(debounce);
                tokio::pin!(window);
                loop {
                    tokio::select! {
                        _ = &mut window => break,
                        next = rx.recv() => match next {
                            Some(SaveEvent::Flush(tx)) => {
                                reply = Some(tx);
                                break;
                            }
                            Some(_) => {}
                            None => {
                                closed = true;
                                break;
                            }
                        },
                    }
                }
            }
        }

        let result = write_snapshot(&file, source.as_ref(), &stats).await;
        if let Some(reply) = reply {
            let _ = reply.send(result);
        }
        if closed {
            break;
        }
    }

    tracing::debug!("Snapshot worker for {} stopped", file.path().display());
}

async fn write_snapshot<S: SnapshotSource>(
    file: &SnapshotFile,
    source: &S,
    stats: &PersistStats,
) -> Result<(), PersistenceError> {
    let result = match source.snapshot_bytes().await {
        Ok(bytes) => file.save(&bytes).await,
        Err(e) => Err(e),
    };

    match &result {
        Ok(()) => {
            stats.snapshots_written.fetch_add(1, Ordering::Relaxed);
            tracing::info!("Saved snapshot to {}", file.path().display());
        }
        Err(e) => {
            stats.failures.fetch_add(1, Ordering::Relaxed);
            tracing::error!("Failed to save snapshot to {}: {}", file.path().display(), e);
        }
    }
    result
}

async fn log_loop(
    mut rx: mpsc::Receiver<SaveEvent>,
    log: AppendLog,
    flush_interval: Duration,
    stats: Arc<PersistStats>,
) {
    // On open failure the reason is kept and reported by every flush.
    let mut writer = log.open_writer().await.map_err(|e| {
        tracing::error!("Cannot open log {}: {}", log.path().display(), e);
        e.to_string()
    });

    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(SaveEvent::Append(record)) => {
                    let appended = match writer.as_mut() {
                        Ok(writer) => writer.append(&record).await,
                        Err(reason) => Err(PersistenceError::Unavailable(reason.clone())),
                    };
                    if let Err(e) = appended {
                        stats.failures.fetch_add(1, Ordering::Relaxed);
                        tracing::error!("Failed to append {} to log: {}", record.key, e);
                    }
                }
                Some(SaveEvent::Dirty) => {}
                Some(SaveEvent::Flush(reply)) => {
                    let _ = reply.send(flush_log(&mut writer, &stats).await);
                }
                None => {
                    let _ = flush_log(&mut writer, &stats).await;
                    break;
                }
            },
            _ = ticker.tick() => {
                let _ = flush_log(&mut writer, &stats).await;
            }
        }
    }

    tracing::debug!("Log worker for {} stopped", log.path().display());
}

async fn flush_log(
    writer: &mut Result<LogWriter, String>,
    stats: &PersistStats,
) -> Result<(), PersistenceError> {
    let writer = match writer {
        Ok(writer) => writer,
        Err(reason) => return Err(PersistenceError::Unavailable(reason.clone())),
    };

    match writer.flush().await {
        Ok(0) => Ok(()),
        Ok(count) => {
            stats
                .records_flushed
                .fetch_add(count as u64, Ordering::Relaxed);
            tracing::debug!("Flushed {} records to log", count);
            Ok(())
        }
        Err(e) => {
            stats.failures.fetch_add(1, Ordering::Relaxed);
            tracing::error!("Failed to flush log: {}", e);
            Err(e)
        }
    }
}
