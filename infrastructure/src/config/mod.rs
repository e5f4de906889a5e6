//! Configuration file loading for sidechat
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `SIDECHAT_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./sidechat.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/sidechat/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileGenerationConfig, FileLoggingConfig,
    FileProviderConfig, FileReplConfig, FileStorageConfig, StorageHostKind,
};
pub use loader::{ConfigError, ConfigLoader};
