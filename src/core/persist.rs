//! Background persistence of cart snapshots.
//!
//! A mutation hands its serialized collection to a [`SnapshotSink`] and returns
//! without waiting. Two sinks exist:
//!
//! * [`DetachedWriter`] spawns one task per snapshot. Writes may complete out of
//!   order, so the stored copy can lag the in-memory cart.
//! * [`QueuedWriter`] feeds a single writer task through a channel, so writes
//!   land in mutation order and the last stored value is the last snapshot.

use crate::domain::ports::KeyValueStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistMode {
    #[default]
    FireAndForget,
    Serialized,
}

#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Schedules `snapshot` for writing. Never blocks and never fails.
    fn submit(&self, snapshot: String);

    /// Waits until every snapshot submitted before this call has been handled.
    async fn flush(&self);
}

pub fn build_sink<S>(
    mode: PersistMode,
    storage: Arc<S>,
    key: String,
    runtime: Handle,
) -> Box<dyn SnapshotSink>
where
    S: KeyValueStore + 'static,
{
    match mode {
        PersistMode::FireAndForget => Box::new(DetachedWriter::new(storage, key, runtime)),
        PersistMode::Serialized => Box::new(QueuedWriter::new(storage, key, &runtime)),
    }
}

async fn write_snapshot<S: KeyValueStore>(storage: &S, key: &str, snapshot: &str) {
    match storage.set(key, snapshot).await {
        Ok(()) => tracing::debug!("Persisted cart snapshot ({} bytes) under '{}'", snapshot.len(), key),
        // Failed writes are not retried; the in-memory cart stays authoritative.
        Err(e) => tracing::warn!("Failed to persist cart under '{}': {}", key, e),
    }
}

pub struct DetachedWriter<S> {
    storage: Arc<S>,
    key: String,
    runtime: Handle,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: KeyValueStore + 'static> DetachedWriter<S> {
    pub fn new(storage: Arc<S>, key: String, runtime: Handle) -> Self {
        Self {
            storage,
            key,
            runtime,
            pending: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl<S: KeyValueStore + 'static> SnapshotSink for DetachedWriter<S> {
    fn submit(&self, snapshot: String) {
        let storage = Arc::clone(&self.storage);
        let key = self.key.clone();
        let handle = self.runtime.spawn(async move {
            write_snapshot(storage.as_ref(), &key, &snapshot).await;
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|task| !task.is_finished());
        pending.push(handle);
    }

    async fn flush(&self) {
        let tasks: Vec<JoinHandle<()>> = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *pending)
        };

        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("Cart persistence task did not complete: {}", e);
            }
        }
    }
}

enum WriteJob {
    Snapshot(String),
    Flush(oneshot::Sender<()>),
}

pub struct QueuedWriter {
    jobs: mpsc::UnboundedSender<WriteJob>,
}

impl QueuedWriter {
    pub fn new<S: KeyValueStore + 'static>(storage: Arc<S>, key: String, runtime: &Handle) -> Self {
        let (jobs, mut queue) = mpsc::unbounded_channel::<WriteJob>();

        // Exits once the writer (and so every sender) is dropped.
        runtime.spawn(async move {
            while let Some(job) = queue.recv().await {
                match job {
                    WriteJob::Snapshot(snapshot) => {
                        write_snapshot(storage.as_ref(), &key, &snapshot).await;
                    }
                    WriteJob::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("Cart writer queue for '{}' closed", key);
        });

        Self { jobs }
    }
}

#[async_trait]
impl SnapshotSink for QueuedWriter {
    fn submit(&self, snapshot: String) {
        if self.jobs.send(WriteJob::Snapshot(snapshot)).is_err() {
            tracing::warn!("Cart writer queue is closed, snapshot dropped");
        }
    }

    async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.jobs.send(WriteJob::Flush(done)).is_err() {
            return;
        }
        let _ = wait.await;
    }
}
