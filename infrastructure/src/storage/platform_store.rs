//! Settings persistence through the active host platform.

use async_trait::async_trait;
use sidechat_application::{KeyValueStore, PlatformApi, PlatformError, StorageMap};
use std::sync::Arc;

/// [`KeyValueStore`] over the host's local storage area.
pub struct PlatformKeyValueStore {
    platform: Arc<dyn PlatformApi>,
}

impl PlatformKeyValueStore {
    pub fn new(platform: Arc<dyn PlatformApi>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl KeyValueStore for PlatformKeyValueStore {
    async fn get_many(&self, keys: &[&str]) -> Result<StorageMap, PlatformError> {
        self.platform.storage_get(keys).await
    }

    async fn set_many(&self, items: StorageMap) -> Result<(), PlatformError> {
        self.platform.storage_set(items).await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), PlatformError> {
        self.platform.storage_remove(keys).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{CallbackPlatform, MemoryCallbackHost};
    use serde_json::json;
    use sidechat_application::SettingsStore;
    use sidechat_domain::{ModelId, SettingsPatch};

    fn store(host: Arc<MemoryCallbackHost>) -> PlatformKeyValueStore {
        PlatformKeyValueStore::new(Arc::new(CallbackPlatform::new(host)))
    }

    #[tokio::test]
    async fn test_single_key_helpers() {
        let store = store(Arc::new(MemoryCallbackHost::new()));

        store.set("model", json!("gemini-1.5-pro")).await.unwrap();
        assert_eq!(store.get("model").await.unwrap(), Some(json!("gemini-1.5-pro")));

        store.remove("model").await.unwrap();
        assert_eq!(store.get("model").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_settings_store_on_platform() {
        let host = Arc::new(MemoryCallbackHost::new());
        let settings = SettingsStore::new(Arc::new(store(host.clone())));

        let saved = settings
            .save_settings(SettingsPatch::new().with_model(ModelId::Gemini25Flash))
            .await
            .unwrap();
        assert_eq!(saved.model, ModelId::Gemini25Flash);

        // Host failures surface unchanged.
        host.fail_next("QUOTA_BYTES quota exceeded");
        let err = settings.get_settings().await.unwrap_err();
        assert_eq!(err.to_string(), "Host error: QUOTA_BYTES quota exceeded");
    }
}
