//! Adapter for callback-based hosts.
//!
//! Each call hands the host a completion callback wired to a oneshot
//! channel. When the callback fires the host's last-error channel is read
//! and, if set, the call fails with that error instead of yielding the
//! callback's value.

use super::host::{Callback, CallbackHost};
use async_trait::async_trait;
use sidechat_application::{HostKind, PlatformApi, PlatformError, StorageMap};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

pub struct CallbackPlatform {
    host: Arc<dyn CallbackHost>,
}

impl CallbackPlatform {
    pub fn new(host: Arc<dyn CallbackHost>) -> Self {
        Self { host }
    }

    /// Run `call` with a completion callback and await it.
    async fn complete<T, F>(&self, call: F) -> Result<T, PlatformError>
    where
        T: Send + 'static,
        F: FnOnce(Callback<T>) + Send,
    {
        let (tx, rx) = oneshot::channel();
        let host = Arc::clone(&self.host);

        call(Box::new(move |value: T| {
            let outcome = match host.last_error() {
                Some(message) => Err(PlatformError::Host(message)),
                None => Ok(value),
            };
            // The caller may have gone away; nothing to report to.
            let _ = tx.send(outcome);
        }));

        rx.await.map_err(|_| PlatformError::CallbackDropped)?
    }
}

fn owned_keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

#[async_trait]
impl PlatformApi for CallbackPlatform {
    fn host_kind(&self) -> HostKind {
        HostKind::CallbackBased
    }

    async fn storage_get(&self, keys: &[&str]) -> Result<StorageMap, PlatformError> {
        let keys = owned_keys(keys);
        self.complete(|done| self.host.storage_get(keys, done)).await
    }

    async fn storage_set(&self, items: StorageMap) -> Result<(), PlatformError> {
        self.complete(|done| self.host.storage_set(items, done)).await
    }

    async fn storage_remove(&self, keys: &[&str]) -> Result<(), PlatformError> {
        let keys = owned_keys(keys);
        self.complete(|done| self.host.storage_remove(keys, done)).await
    }

    async fn open_panel(&self) -> Result<(), PlatformError> {
        let window_id = self.complete(|done| self.host.current_window(done)).await?;
        debug!("Opening side panel for window {}", window_id);
        self.complete(|done| self.host.open_side_panel(window_id, done))
            .await
    }

    async fn toggle_panel(&self) -> Result<(), PlatformError> {
        debug!("Callback host has no panel toggle; ignoring");
        Ok(())
    }

    fn supports_toggle(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::MemoryCallbackHost;
    use serde_json::json;

    /// Host that loses every callback.
    struct DroppingHost;

    impl CallbackHost for DroppingHost {
        fn storage_get(&self, _keys: Vec<String>, callback: Callback<StorageMap>) {
            drop(callback);
        }

        fn storage_set(&self, _items: StorageMap, callback: Callback<()>) {
            drop(callback);
        }

        fn storage_remove(&self, _keys: Vec<String>, callback: Callback<()>) {
            drop(callback);
        }

        fn last_error(&self) -> Option<String> {
            None
        }

        fn current_window(&self, callback: Callback<u64>) {
            drop(callback);
        }

        fn open_side_panel(&self, _window_id: u64, callback: Callback<()>) {
            drop(callback);
        }
    }

    #[tokio::test]
    async fn test_storage_round_trip() {
        let platform = CallbackPlatform::new(Arc::new(MemoryCallbackHost::new()));

        let mut items = StorageMap::new();
        items.insert("model".to_string(), json!("gemini-1.5-pro"));
        items.insert("systemPrompt".to_string(), json!("be terse"));
        platform.storage_set(items).await.unwrap();

        let read = platform.storage_get(&["model", "apiKey"]).await.unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read["model"], json!("gemini-1.5-pro"));

        platform.storage_remove(&["model", "apiKey"]).await.unwrap();
        assert!(platform.storage_get(&["model"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_last_error_becomes_err() {
        let host = Arc::new(MemoryCallbackHost::new());
        let platform = CallbackPlatform::new(host.clone());

        host.fail_next("QUOTA_BYTES quota exceeded");
        let err = platform.storage_set(StorageMap::new()).await.unwrap_err();
        assert!(matches!(err, PlatformError::Host(ref m) if m == "QUOTA_BYTES quota exceeded"));

        // The error channel is cleared once the callback has run.
        assert_eq!(host.last_error(), None);
        platform.storage_set(StorageMap::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_callback() {
        let platform = CallbackPlatform::new(Arc::new(DroppingHost));
        let err = platform.storage_get(&["apiKey"]).await.unwrap_err();
        assert!(matches!(err, PlatformError::CallbackDropped));
    }

    #[tokio::test]
    async fn test_open_panel_uses_current_window() {
        let host = Arc::new(MemoryCallbackHost::new());
        let platform = CallbackPlatform::new(host.clone());

        platform.open_panel().await.unwrap();
        assert_eq!(host.opened_panels(), vec![host.window_id()]);
    }

    #[tokio::test]
    async fn test_toggle_is_noop() {
        let host = Arc::new(MemoryCallbackHost::new());
        let platform = CallbackPlatform::new(host.clone());

        platform.toggle_panel().await.unwrap();
        assert!(!platform.supports_toggle());
        assert!(host.opened_panels().is_empty());
        assert_eq!(platform.host_kind(), HostKind::CallbackBased);
    }
}
