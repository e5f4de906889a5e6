//! Application layer for sidechat
//!
//! This crate contains use cases and port definitions.
//! It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    chat_client::{CONNECTION_PROBE, ChatClient, ChatClientFactory, ChatError, ChunkSink},
    chat_view::{ChatView, NoChatView},
    key_value_store::KeyValueStore,
    platform::{HostKind, PlatformApi, PlatformError, StorageMap},
};
pub use use_cases::chat_session::{ChatSessionController, ClearOutcome, SendOutcome};
pub use use_cases::settings_store::{SettingsError, SettingsEvent, SettingsStore};
