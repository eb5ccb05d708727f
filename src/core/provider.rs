use crate::core::cart::{CartStore, StoreOptions};
use crate::domain::ports::KeyValueStore;
use crate::utils::error::{CartError, Result};
use std::sync::Arc;

/// Owns the application's cart for the lifetime of a mount.
///
/// Construct it once at startup and hand out the store through [`cart`].
/// An unmounted provider answers every access with
/// [`CartError::NotInitialized`].
///
/// [`cart`]: CartProvider::cart
pub struct CartProvider<S: KeyValueStore + 'static> {
    store: Option<Arc<CartStore<S>>>,
}

impl<S: KeyValueStore + 'static> CartProvider<S> {
    pub fn unmounted() -> Self {
        Self { store: None }
    }

    /// Creates the store and starts restoring it in the background.
    pub fn mount(storage: S, options: StoreOptions) -> Result<Self> {
        let store = Arc::new(CartStore::new(storage, options)?);
        store.spawn_restore();
        tracing::debug!("Cart provider mounted on '{}'", store.options().key);
        Ok(Self { store: Some(store) })
    }

    pub fn is_mounted(&self) -> bool {
        self.store.is_some()
    }

    pub fn cart(&self) -> Result<Arc<CartStore<S>>> {
        self.store.clone().ok_or(CartError::NotInitialized)
    }

    /// Flushes pending writes and unmounts the store.
    pub async fn shutdown(&mut self) {
        if let Some(store) = self.store.take() {
            store.flush().await;
            tracing::debug!("Cart provider unmounted");
        }
    }
}

impl<S: KeyValueStore + 'static> Default for CartProvider<S> {
    fn default() -> Self {
        Self::unmounted()
    }
}
