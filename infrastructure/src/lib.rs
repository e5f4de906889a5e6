//! Infrastructure layer for sidechat
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the Gemini chat client, the host platform
//! adapters, platform-backed storage and configuration file loading.

pub mod config;
pub mod gemini;
pub mod platform;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, ConfigValidationError, FileConfig, FileReplConfig,
    StorageHostKind,
};
pub use gemini::{
    DEFAULT_BASE_URL, GeminiChatClient, GeminiClientConfig, GeminiClientFactory, SAFETY_REFUSAL,
};
pub use platform::{
    CallbackHost, CallbackPlatform, JsonFileHost, MemoryCallbackHost, PromiseHost,
    PromisePlatform, detect_platform,
};
pub use storage::PlatformKeyValueStore;
