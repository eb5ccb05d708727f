use crate::core::persist::{build_sink, PersistMode, SnapshotSink};
use crate::domain::model::{CartCollection, LineItem, NewProduct};
use crate::domain::ports::KeyValueStore;
use crate::utils::error::{CartError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_STORAGE_KEY: &str = "@GoMarketplace";

/// What to do when the stored cart cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptPolicy {
    /// Ignore the stored value, log a warning and keep the in-memory cart
    /// as it is. That cart is empty unless it was mutated during restoration.
    #[default]
    Empty,
    /// Move the store to [`Phase::Failed`] and report the error from restoration.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub key: String,
    pub mode: PersistMode,
    pub on_corrupt: CorruptPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            mode: PersistMode::default(),
            on_corrupt: CorruptPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// The stored cart has not been read yet; `products` may be empty.
    Restoring,
    Ready,
    /// The stored cart was corrupted. The in-memory cart still works.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored { items: usize },
    Empty,
    /// The stored value was unreadable and was ignored; the in-memory cart
    /// was left as it was.
    Discarded,
    /// The storage read failed; the in-memory cart was left as it was.
    Unavailable,
    AlreadyRestored,
}

/// In-memory cart kept in sync with a key-value slot.
///
/// Mutations apply to memory synchronously and schedule a write of the
/// resulting collection. They never wait for that write and never report its
/// failure; `products` is always the authoritative view.
pub struct CartStore<S: KeyValueStore + 'static> {
    storage: Arc<S>,
    options: StoreOptions,
    runtime: Handle,
    collection: RwLock<CartCollection>,
    sink: Box<dyn SnapshotSink>,
    restore_requested: AtomicBool,
    restore_started: AtomicBool,
    phase: watch::Sender<Phase>,
}

impl<S: KeyValueStore + 'static> CartStore<S> {
    /// Creates an empty store in the `Restoring` phase.
    ///
    /// Must be called from within a Tokio runtime; writes are scheduled on it.
    pub fn new(storage: S, options: StoreOptions) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| CartError::Runtime {
            message: e.to_string(),
        })?;
        let storage = Arc::new(storage);
        let sink = build_sink(
            options.mode,
            Arc::clone(&storage),
            options.key.clone(),
            runtime.clone(),
        );
        let (phase, _) = watch::channel(Phase::Restoring);

        Ok(Self {
            storage,
            options,
            runtime,
            collection: RwLock::new(CartCollection::new()),
            sink,
            restore_requested: AtomicBool::new(false),
            restore_started: AtomicBool::new(false),
            phase,
        })
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn phase(&self) -> Phase {
        self.phase.borrow().clone()
    }

    pub fn products(&self) -> Vec<LineItem> {
        self.collection().into_items()
    }

    pub fn collection(&self) -> CartCollection {
        self.collection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn add_to_cart(&self, item: NewProduct) {
        let id = item.id.clone();
        self.mutate(|collection| {
            collection.add(item);
            tracing::debug!("add_to_cart '{}'", id);
        });
    }

    pub fn increment(&self, id: &str) {
        self.mutate(|collection| {
            let found = collection.increment(id);
            tracing::debug!("increment '{}' (found: {})", id, found);
        });
    }

    pub fn decrement(&self, id: &str) {
        self.mutate(|collection| {
            let found = collection.decrement(id);
            tracing::debug!("decrement '{}' (found: {})", id, found);
        });
    }

    fn write_collection(&self) -> RwLockWriteGuard<'_, CartCollection> {
        self.collection.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<F>(&self, apply: F)
    where
        F: FnOnce(&mut CartCollection),
    {
        let mut collection = self.write_collection();
        apply(&mut collection);

        // Submitted under the lock so the sink sees snapshots in mutation order.
        match collection.to_json() {
            Ok(snapshot) => self.sink.submit(snapshot),
            Err(e) => tracing::error!("Failed to serialize cart snapshot: {}", e),
        }
    }

    /// Reads the stored cart once and replaces the in-memory collection with it.
    ///
    /// Later calls return [`RestoreOutcome::AlreadyRestored`] without touching
    /// storage.
    pub async fn restore(&self) -> Result<RestoreOutcome> {
        self.restore_requested.store(true, Ordering::SeqCst);
        if self.restore_started.swap(true, Ordering::SeqCst) {
            return Ok(RestoreOutcome::AlreadyRestored);
        }

        let key = self.options.key.as_str();
        tracing::debug!("Restoring cart from '{}'", key);

        let raw = match self.storage.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Could not read stored cart '{}', keeping the in-memory cart: {}", key, e);
                self.phase.send_replace(Phase::Ready);
                return Ok(RestoreOutcome::Unavailable);
            }
        };

        let raw = match raw {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                tracing::info!("No stored cart under '{}'", key);
                self.phase.send_replace(Phase::Ready);
                return Ok(RestoreOutcome::Empty);
            }
        };

        match CartCollection::from_json(&raw) {
            Ok(items) => {
                let (restored, normalized) = CartCollection::normalized(items);
                if normalized {
                    tracing::warn!(
                        "Stored cart under '{}' had zero-quantity or duplicate items; normalized",
                        key
                    );
                }
                let count = restored.len();
                *self.write_collection() = restored;
                self.phase.send_replace(Phase::Ready);
                tracing::info!("Restored {} cart item(s) from '{}'", count, key);
                Ok(RestoreOutcome::Restored { items: count })
            }
            Err(e) => match self.options.on_corrupt {
                CorruptPolicy::Empty => {
                    tracing::warn!(
                        "Stored cart under '{}' is corrupted, ignoring it and keeping {} in-memory item(s): {}",
                        key,
                        self.collection().len(),
                        e
                    );
                    self.phase.send_replace(Phase::Ready);
                    Ok(RestoreOutcome::Discarded)
                }
                CorruptPolicy::Fail => {
                    tracing::error!("Stored cart under '{}' is corrupted: {}", key, e);
                    self.phase.send_replace(Phase::Failed(e.to_string()));
                    Err(CartError::CorruptedSnapshot {
                        key: key.to_string(),
                        message: e.to_string(),
                    })
                }
            },
        }
    }

    /// Runs [`restore`](Self::restore) on a background task.
    pub fn spawn_restore(self: &Arc<Self>) -> JoinHandle<()> {
        self.restore_requested.store(true, Ordering::SeqCst);
        let store = Arc::clone(self);
        self.runtime.spawn(async move {
            if let Err(e) = store.restore().await {
                tracing::warn!("Cart restoration failed: {}", e);
            }
        })
    }

    /// Waits until restoration has finished.
    ///
    /// Returns [`CartError::RestoreNotStarted`] right away when neither
    /// [`restore`](Self::restore) nor [`spawn_restore`](Self::spawn_restore)
    /// has been called, since nothing would ever end the wait.
    pub async fn wait_ready(&self) -> Result<()> {
        if !self.restore_requested.load(Ordering::SeqCst) {
            return Err(CartError::RestoreNotStarted);
        }

        let mut phase = self.phase.subscribe();
        let current = phase
            .wait_for(|phase| *phase != Phase::Restoring)
            .await
            .map_err(|e| CartError::Runtime {
                message: e.to_string(),
            })?
            .clone();

        match current {
            Phase::Failed(message) => Err(CartError::CorruptedSnapshot {
                key: self.options.key.clone(),
                message,
            }),
            _ => Ok(()),
        }
    }

    /// Waits for every write scheduled so far.
    pub async fn flush(&self) {
        self.sink.flush().await;
    }
}
