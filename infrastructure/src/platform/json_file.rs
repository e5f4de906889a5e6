//! Promise-native host backed by a JSON file.
//!
//! The file holds one object per storage area; only the `local` area is
//! used. Writes go to a sibling temp file first and are renamed into place.

use super::host::PromiseHost;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sidechat_application::{PlatformError, StorageMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

const LOCAL_AREA: &str = "local";

pub struct JsonFileHost {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
    panel_open: AtomicBool,
}

impl JsonFileHost {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            panel_open: AtomicBool::new(false),
        }
    }

    /// Default location: `$XDG_DATA_HOME/sidechat/storage.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("sidechat").join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open.load(Ordering::SeqCst)
    }

    async fn read_all(&self) -> Result<Map<String, Value>, PlatformError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&content)? {
            Value::Object(areas) => Ok(areas),
            _ => Err(PlatformError::Host(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    async fn read_local(&self) -> Result<StorageMap, PlatformError> {
        let mut areas = self.read_all().await?;
        match areas.remove(LOCAL_AREA) {
            Some(Value::Object(local)) => Ok(local),
            _ => Ok(StorageMap::new()),
        }
    }

    async fn write_local(&self, local: StorageMap) -> Result<(), PlatformError> {
        let mut areas = self.read_all().await?;
        areas.insert(LOCAL_AREA.to_string(), Value::Object(local));

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(&Value::Object(areas))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Apply `update` to the local area under the write lock.
    async fn modify(&self, update: impl FnOnce(&mut StorageMap)) -> Result<(), PlatformError> {
        let _guard = self.write_lock.lock().await;
        let mut local = self.read_local().await?;
        update(&mut local);
        self.write_local(local).await
    }
}

#[async_trait]
impl PromiseHost for JsonFileHost {
    async fn storage_get(&self, keys: &[&str]) -> Result<StorageMap, PlatformError> {
        let mut local = self.read_local().await?;
        Ok(keys
            .iter()
            .filter_map(|k| local.remove(*k).map(|v| (k.to_string(), v)))
            .collect())
    }

    async fn storage_set(&self, items: StorageMap) -> Result<(), PlatformError> {
        debug!("Writing {} keys to {}", items.len(), self.path.display());
        self.modify(|local| local.extend(items)).await
    }

    async fn storage_remove(&self, keys: &[&str]) -> Result<(), PlatformError> {
        self.modify(|local| {
            for key in keys {
                local.remove(*key);
            }
        })
        .await
    }

    async fn toggle_sidebar(&self) -> Result<(), PlatformError> {
        let was_open = self.panel_open.fetch_xor(true, Ordering::SeqCst);
        info!("Panel {}", if was_open { "closed" } else { "opened" });
        Ok(())
    }
}
