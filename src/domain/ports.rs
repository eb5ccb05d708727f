use crate::utils::error::Result;

/// Durable key-value slot the cart persists into.
///
/// `set` overwrites any prior value; there is no locking or versioning, the
/// last writer wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn set(&self, key: &str, value: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}
