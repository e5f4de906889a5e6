//! Adapter for promise-native hosts.

use super::host::PromiseHost;
use async_trait::async_trait;
use sidechat_application::{HostKind, PlatformApi, PlatformError, StorageMap};
use std::sync::Arc;
use tracing::debug;

/// Passes every call straight through to the host.
pub struct PromisePlatform {
    host: Arc<dyn PromiseHost>,
}

impl PromisePlatform {
    pub fn new(host: Arc<dyn PromiseHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl PlatformApi for PromisePlatform {
    fn host_kind(&self) -> HostKind {
        HostKind::PromiseNative
    }

    async fn storage_get(&self, keys: &[&str]) -> Result<StorageMap, PlatformError> {
        self.host.storage_get(keys).await
    }

    async fn storage_set(&self, items: StorageMap) -> Result<(), PlatformError> {
        self.host.storage_set(items).await
    }

    async fn storage_remove(&self, keys: &[&str]) -> Result<(), PlatformError> {
        self.host.storage_remove(keys).await
    }

    async fn open_panel(&self) -> Result<(), PlatformError> {
        // No scriptable open on this host.
        debug!("open_panel on promise-native host, toggling instead");
        self.host.toggle_sidebar().await
    }

    async fn toggle_panel(&self) -> Result<(), PlatformError> {
        self.host.toggle_sidebar().await
    }

    fn supports_toggle(&self) -> bool {
        true
    }
}
