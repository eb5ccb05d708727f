use crate::domain::ports::KeyValueStore;
use crate::utils::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-local key-value store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut map = HashMap::new();
        map.insert(key.into(), value.into());
        Self {
            inner: Arc::new(Mutex::new(map)),
        }
    }
}

impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.inner.lock().await;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.inner.lock().await;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
