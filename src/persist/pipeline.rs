//! Persistence pipeline
//!
//! Single-consumer snapshot queue drained by a dedicated writer thread.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};

use crate::error::{Result, TableKvError};
use crate::table::{Snapshot, SnapshotSink};

use super::file::write_snapshot;

/// Work item for the writer thread
enum Job {
    /// Rewrite the snapshot's table file
    Write(Snapshot),

    /// Acknowledge once every earlier job has been processed
    Barrier(Sender<()>),
}

#[derive(Default)]
struct Counters {
    written: AtomicU64,
    failed: AtomicU64,
}

/// Background writer for table snapshots
///
/// ## Guarantees:
/// - Snapshots are written in the order they were enqueued
/// - A failed write is logged and skipped; later snapshots (for any table)
///   are still written, and the next successful write of the same table
///   brings its file back in line with memory
/// - Dropping the persister drains the queue before the thread exits
pub struct Persister {
    sender: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl Persister {
    const THREAD_NAME: &'static str = "tablekv-persist";

    /// Spawn the writer thread for `data_dir`
    pub fn start(data_dir: &Path, queue_capacity: usize, sync_on_write: bool) -> Result<Self> {
        let (sender, receiver) = channel::bounded(queue_capacity);
        let counters = Arc::new(Counters::default());

        let dir = data_dir.to_path_buf();
        let thread_counters = Arc::clone(&counters);
        let handle = thread::Builder::new()
            .name(Self::THREAD_NAME.to_string())
            .spawn(move || writer_loop(&dir, sync_on_write, &receiver, &thread_counters))?;

        tracing::debug!(
            "Persister started for {} (queue capacity {})",
            data_dir.display(),
            queue_capacity
        );

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            counters,
        })
    }

    /// Queue a snapshot for writing
    ///
    /// Returns immediately unless the queue is full, in which case the
    /// caller waits for the writer to make room.
    pub fn submit(&self, snapshot: Snapshot) {
        let Some(sender) = self.sender.as_ref() else {
            tracing::error!("Persister is shut down, dropping snapshot of {}", snapshot.table);
            return;
        };

        match sender.try_send(Job::Write(snapshot)) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                tracing::warn!("Persistence queue full, waiting for the writer");
                if sender.send(job).is_err() {
                    tracing::error!("Persistence queue closed, snapshot dropped");
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::error!("Persistence queue closed, snapshot dropped");
            }
        }
    }

    /// Block until every snapshot queued before this call has been processed
    pub fn sync(&self) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| TableKvError::Persistence("persister is shut down".to_string()))?;

        let (ack_tx, ack_rx) = channel::bounded(1);
        sender
            .send(Job::Barrier(ack_tx))
            .map_err(|_| TableKvError::Persistence("writer thread has stopped".to_string()))?;
        ack_rx
            .recv()
            .map_err(|_| TableKvError::Persistence("writer thread has stopped".to_string()))
    }

    /// Close the queue, drain it, and join the writer thread
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    /// Number of snapshots written successfully
    pub fn written(&self) -> u64 {
        self.counters.written.load(Ordering::Relaxed)
    }

    /// Number of snapshots whose write failed
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    fn stop(&mut self) -> Result<()> {
        // Dropping the sender ends the writer loop once the queue is empty
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| TableKvError::Persistence("writer thread panicked".to_string()))?;
            tracing::debug!(
                "Persister stopped: {} written, {} failed",
                self.written(),
                self.failed()
            );
        }
        Ok(())
    }
}

impl SnapshotSink for Persister {
    fn enqueue(&self, snapshot: Snapshot) {
        self.submit(snapshot);
    }
}

impl Drop for Persister {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!("Failed to stop persister: {}", e);
        }
    }
}

fn writer_loop(data_dir: &Path, sync: bool, receiver: &Receiver<Job>, counters: &Counters) {
    for job in receiver.iter() {
        match job {
            Job::Write(snapshot) => match write_snapshot(data_dir, &snapshot, sync) {
                Ok(()) => {
                    counters.written.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(
                        "Persisted table {} ({} entries)",
                        snapshot.table,
                        snapshot.entries.len()
                    );
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::error!("Failed to persist table {}: {}", snapshot.table, e);
                }
            },
            Job::Barrier(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
