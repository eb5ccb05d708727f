use cart_store::{
    CartCollection, CartError, CartProvider, CartStore, CorruptPolicy, FileStorage, KeyValueStore,
    LineItem, MemoryStorage, NewProduct, PersistMode, Phase, RestoreOutcome, StoreOptions,
    DEFAULT_STORAGE_KEY,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn options(mode: PersistMode, on_corrupt: CorruptPolicy) -> StoreOptions {
    StoreOptions {
        mode,
        on_corrupt,
        ..StoreOptions::default()
    }
}

async fn stored_items(storage: &impl KeyValueStore) -> Vec<LineItem> {
    let raw = storage.get(DEFAULT_STORAGE_KEY).await.unwrap().unwrap();
    CartCollection::from_json(&raw).unwrap()
}

/// Every write fails; reads behave like an empty store.
struct BrokenStorage {
    writes: Arc<AtomicUsize>,
}

impl KeyValueStore for BrokenStorage {
    async fn get(&self, _key: &str) -> cart_store::Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> cart_store::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(CartError::storage("disk full"))
    }
}

/// Read failures on every call.
struct UnreadableStorage;

impl KeyValueStore for UnreadableStorage {
    async fn get(&self, _key: &str) -> cart_store::Result<Option<String>> {
        Err(CartError::storage("permission denied"))
    }

    async fn set(&self, _key: &str, _value: &str) -> cart_store::Result<()> {
        Ok(())
    }
}

/// Delays the first write so that it finishes after the second.
#[derive(Clone)]
struct SlowFirstWrite {
    inner: MemoryStorage,
    calls: Arc<AtomicUsize>,
}

impl KeyValueStore for SlowFirstWrite {
    async fn get(&self, key: &str) -> cart_store::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> cart_store::Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        self.inner.set(key, value).await
    }
}

#[tokio::test]
async fn test_cart_survives_restart_on_disk() {
    let dir = TempDir::new().unwrap();

    // Several writes in a row: only the ordered writer guarantees the last one wins on disk.
    let ordered = options(PersistMode::Serialized, CorruptPolicy::Empty);

    let mut provider = CartProvider::mount(FileStorage::new(dir.path()), ordered.clone()).unwrap();
    let cart = provider.cart().unwrap();
    cart.wait_ready().await.unwrap();
    cart.add_to_cart(NewProduct::new("A", "Shirt", "u", 10.0));
    cart.add_to_cart(NewProduct::new("B", "Hat", "h", 4.5));
    cart.add_to_cart(NewProduct::new("A", "Shirt", "u", 10.0));
    cart.decrement("B");
    let before = cart.collection();
    drop(cart);
    provider.shutdown().await;

    assert!(dir.path().join("_40GoMarketplace.json").exists());

    let restarted = CartProvider::mount(FileStorage::new(dir.path()), ordered).unwrap();
    let cart = restarted.cart().unwrap();
    cart.wait_ready().await.unwrap();

    assert_eq!(cart.collection(), before);
    assert_eq!(cart.products().len(), 1);
    assert_eq!(cart.products()[0].quantity, 2);
}

#[tokio::test]
async fn test_write_failures_leave_memory_authoritative() {
    let writes = Arc::new(AtomicUsize::new(0));
    let store = CartStore::new(
        BrokenStorage {
            writes: Arc::clone(&writes),
        },
        StoreOptions::default(),
    )
    .unwrap();
    store.restore().await.unwrap();

    store.add_to_cart(NewProduct::new("A", "Shirt", "u", 10.0));
    store.increment("A");
    store.flush().await;

    assert_eq!(writes.load(Ordering::SeqCst), 2);
    assert_eq!(store.products()[0].quantity, 2);
}

#[tokio::test]
async fn test_unreadable_storage_starts_empty() {
    let store = CartStore::new(UnreadableStorage, StoreOptions::default()).unwrap();

    assert_eq!(store.restore().await.unwrap(), RestoreOutcome::Unavailable);
    assert_eq!(store.phase(), Phase::Ready);
    assert!(store.products().is_empty());
}

#[tokio::test]
async fn test_corrupted_value_discarded_by_default() {
    let storage = MemoryStorage::with_value(DEFAULT_STORAGE_KEY, "{not json");
    let store = CartStore::new(storage.clone(), StoreOptions::default()).unwrap();

    assert_eq!(store.restore().await.unwrap(), RestoreOutcome::Discarded);
    store.wait_ready().await.unwrap();
    assert!(store.products().is_empty());

    // Left in place until the next mutation overwrites it.
    assert_eq!(
        storage.get(DEFAULT_STORAGE_KEY).await.unwrap(),
        Some("{not json".to_string())
    );
    store.add_to_cart(NewProduct::new("A", "Shirt", "u", 10.0));
    store.flush().await;
    assert_eq!(stored_items(&storage).await.len(), 1);
}

#[tokio::test]
async fn test_corrupted_value_fails_when_configured() {
    let storage = MemoryStorage::with_value(DEFAULT_STORAGE_KEY, "[{\"id\": 1}]");
    let provider = CartProvider::mount(
        storage,
        options(PersistMode::FireAndForget, CorruptPolicy::Fail),
    )
    .unwrap();
    let cart = provider.cart().unwrap();

    let err = cart.wait_ready().await.unwrap_err();
    assert!(matches!(err, CartError::CorruptedSnapshot { ref key, .. } if key == DEFAULT_STORAGE_KEY));
    assert!(matches!(cart.phase(), Phase::Failed(_)));

    cart.add_to_cart(NewProduct::new("A", "Shirt", "u", 10.0));
    assert_eq!(cart.products().len(), 1);
}

#[tokio::test]
async fn test_restore_normalizes_invalid_stored_items() {
    let raw = r#"[
        {"id":"A","title":"Shirt","image_url":"u","price":10,"quantity":1},
        {"id":"B","title":"Hat","image_url":"h","price":4,"quantity":0},
        {"id":"A","title":"Shirt","image_url":"u","price":10,"quantity":2}
    ]"#;
    let store = CartStore::new(
        MemoryStorage::with_value(DEFAULT_STORAGE_KEY, raw),
        StoreOptions::default(),
    )
    .unwrap();

    assert_eq!(
        store.restore().await.unwrap(),
        RestoreOutcome::Restored { items: 1 }
    );
    let products = store.products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].quantity, 3);
}

#[tokio::test]
async fn test_serialized_mode_persists_latest_snapshot() {
    let storage = SlowFirstWrite {
        inner: MemoryStorage::new(),
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let store = CartStore::new(
        storage.clone(),
        options(PersistMode::Serialized, CorruptPolicy::Empty),
    )
    .unwrap();
    store.restore().await.unwrap();

    store.add_to_cart(NewProduct::new("A", "Shirt", "u", 10.0));
    store.add_to_cart(NewProduct::new("A", "Shirt", "u", 10.0));
    store.flush().await;

    assert_eq!(stored_items(&storage.inner).await, store.products());
}

#[tokio::test]
async fn test_fire_and_forget_writes_may_land_out_of_order() {
    let storage = SlowFirstWrite {
        inner: MemoryStorage::new(),
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let store = CartStore::new(storage.clone(), StoreOptions::default()).unwrap();
    store.restore().await.unwrap();

    store.add_to_cart(NewProduct::new("A", "Shirt", "u", 10.0));
    store.add_to_cart(NewProduct::new("A", "Shirt", "u", 10.0));
    store.flush().await;

    // Memory is current; the slow first write overwrote the newer snapshot.
    assert_eq!(store.products()[0].quantity, 2);
    assert_eq!(stored_items(&storage.inner).await[0].quantity, 1);
}

#[tokio::test]
async fn test_custom_key_uses_own_slot() {
    let storage = MemoryStorage::new();
    let store = CartStore::new(
        storage.clone(),
        StoreOptions {
            key: "other-cart".to_string(),
            ..StoreOptions::default()
        },
    )
    .unwrap();
    store.restore().await.unwrap();

    store.add_to_cart(NewProduct::new("A", "Shirt", "u", 10.0));
    store.flush().await;

    assert!(storage.get("other-cart").await.unwrap().is_some());
    assert!(storage.get(DEFAULT_STORAGE_KEY).await.unwrap().is_none());
}
