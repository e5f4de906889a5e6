//! Platform port
//!
//! One async surface over the host runtime's storage and side-panel
//! primitives. The concrete adapter is chosen once at startup and passed
//! to every consumer.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw key/value map as stored by the host.
pub type StorageMap = Map<String, Value>;

/// Errors raised by a host runtime.
///
/// These are never retried or recovered locally; they propagate to the
/// caller unchanged.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Error reported by the host itself (e.g. through its last-error channel).
    #[error("Host error: {0}")]
    Host(String),

    #[error("Host dropped the completion callback")]
    CallbackDropped,

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No supported host runtime detected")]
    NoHost,
}

/// Which host runtime family is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// Promise-native host; the panel can only be toggled.
    PromiseNative,
    /// Callback-based host with a last-error channel; the panel can be opened.
    CallbackBased,
}

impl HostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostKind::PromiseNative => "promise-native",
            HostKind::CallbackBased => "callback-based",
        }
    }
}

/// Unified host API.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    fn host_kind(&self) -> HostKind;

    /// Read `keys`; absent keys are simply missing from the result.
    async fn storage_get(&self, keys: &[&str]) -> Result<StorageMap, PlatformError>;

    /// Write every entry of `items`.
    async fn storage_set(&self, items: StorageMap) -> Result<(), PlatformError>;

    /// Delete `keys`; deleting an absent key is not an error.
    async fn storage_remove(&self, keys: &[&str]) -> Result<(), PlatformError>;

    /// Open the chat panel for the active window (or toggle it where the
    /// host cannot open it directly).
    async fn open_panel(&self) -> Result<(), PlatformError>;

    /// Toggle the chat panel. A no-op where the host has no toggle.
    async fn toggle_panel(&self) -> Result<(), PlatformError>;

    /// Whether [`toggle_panel`](Self::toggle_panel) does anything.
    fn supports_toggle(&self) -> bool;
}
