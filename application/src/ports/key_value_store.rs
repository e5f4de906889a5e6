//! Key-value store port
//!
//! Persistence capability consumed by the settings store.

use super::platform::{PlatformError, StorageMap};
use async_trait::async_trait;
use serde_json::Value;

/// Async key-value persistence.
///
/// Errors are the host's own and are passed through untouched.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read several keys at once; absent keys are missing from the result.
    async fn get_many(&self, keys: &[&str]) -> Result<StorageMap, PlatformError>;

    /// Write every entry of `items`.
    async fn set_many(&self, items: StorageMap) -> Result<(), PlatformError>;

    /// Delete several keys at once.
    async fn remove_many(&self, keys: &[&str]) -> Result<(), PlatformError>;

    /// Read one key.
    async fn get(&self, key: &str) -> Result<Option<Value>, PlatformError> {
        let mut items = self.get_many(&[key]).await?;
        Ok(items.remove(key))
    }

    /// Write one key.
    async fn set(&self, key: &str, value: Value) -> Result<(), PlatformError> {
        let mut items = StorageMap::new();
        items.insert(key.to_string(), value);
        self.set_many(items).await
    }

    /// Delete one key.
    async fn remove(&self, key: &str) -> Result<(), PlatformError> {
        self.remove_many(&[key]).await
    }
}
