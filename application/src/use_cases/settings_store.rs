//! Settings store use case.
//!
//! Typed access to the persisted settings keys on top of a
//! [`KeyValueStore`], plus the settings-updated broadcast that lets open
//! chat sessions pick up fresh credentials.

use crate::ports::key_value_store::KeyValueStore;
use crate::ports::platform::PlatformError;
use serde_json::Value;
use sidechat_domain::{DomainError, Settings, SettingsKey, SettingsPatch};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Capacity of the settings event channel. Subscribers only ever need the
/// latest event, so lagging is harmless.
const EVENT_CAPACITY: usize = 16;

/// Errors that can occur while reading or writing settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Persistence failure, passed through unchanged.
    #[error(transparent)]
    Storage(#[from] PlatformError),

    #[error(transparent)]
    InvalidApiKey(#[from] DomainError),
}

/// Cross-surface notification emitted after a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsEvent {
    SettingsUpdated,
}

/// Typed settings persistence.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<SettingsEvent>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { store, events }
    }

    /// Subscribe to settings notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SettingsEvent> {
        self.events.subscribe()
    }

    /// Read a single key.
    pub async fn get(&self, key: SettingsKey) -> Result<Option<Value>, SettingsError> {
        Ok(self.store.get(key.as_str()).await?)
    }

    /// Write a single key.
    pub async fn set(&self, key: SettingsKey, value: Value) -> Result<(), SettingsError> {
        Ok(self.store.set(key.as_str(), value).await?)
    }

    /// Delete a single key.
    pub async fn remove(&self, key: SettingsKey) -> Result<(), SettingsError> {
        Ok(self.store.remove(key.as_str()).await?)
    }

    /// Resolve the full settings record, applying defaults for absent keys.
    pub async fn get_settings(&self) -> Result<Settings, SettingsError> {
        let stored = self.store.get_many(&SettingsKey::all_names()).await?;
        Ok(Settings::from_storage(&stored))
    }

    /// Persist the fields present in `patch` and notify subscribers.
    ///
    /// Fields left `None` are not touched. Returns the settings as they
    /// resolve after the write.
    pub async fn save_settings(&self, patch: SettingsPatch) -> Result<Settings, SettingsError> {
        patch.validate()?;

        if patch.is_empty() {
            debug!("Empty settings patch; nothing to write");
            return self.get_settings().await;
        }

        let existing_blob = if patch.extra.is_empty() {
            None
        } else {
            match self.get(SettingsKey::Settings).await? {
                Some(Value::Object(blob)) => Some(blob),
                _ => None,
            }
        };

        let writes = patch.to_storage_writes(existing_blob.as_ref());
        debug!(
            keys = ?writes.keys().collect::<Vec<_>>(),
            "Writing settings"
        );
        self.store.set_many(writes).await?;

        let settings = self.get_settings().await?;
        info!("Settings saved (model: {})", settings.model);

        // No subscribers is fine.
        let _ = self.events.send(SettingsEvent::SettingsUpdated);

        Ok(settings)
    }
}
