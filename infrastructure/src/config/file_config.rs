//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.

use crate::gemini::{DEFAULT_BASE_URL, GeminiClientConfig, GenerationConfig, default_safety_settings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("request_timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("provider base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("temperature must be between 0.0 and 2.0 (got {0})")]
    InvalidTemperature(f32),

    #[error("top_p must be between 0.0 and 1.0 (got {0})")]
    InvalidTopP(f32),

    #[error("max_output_tokens cannot be 0")]
    InvalidMaxOutputTokens,
}

/// Raw provider configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// API root, without the version segment
    pub base_url: String,
    /// Timeout for non-streaming requests
    pub request_timeout_seconds: u64,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: 60,
        }
    }
}

/// Raw sampling configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for FileGenerationConfig {
    fn default() -> Self {
        let defaults = GenerationConfig::default();
        Self {
            temperature: defaults.temperature,
            top_p: defaults.top_p,
            top_k: defaults.top_k,
            max_output_tokens: defaults.max_output_tokens,
        }
    }
}

/// Which host runtime backs settings storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageHostKind {
    /// Promise-native host persisting to a JSON file
    #[default]
    File,
    /// Callback-based host kept in memory; nothing survives the process
    Memory,
}

/// Raw storage configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    pub host: StorageHostKind,
    /// Storage file for the `file` host (defaults to the XDG data dir)
    pub path: Option<PathBuf>,
}

/// Raw REPL configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Show a spinner while waiting for the first chunk
    pub show_progress: bool,
    /// Path to history file
    pub history_file: Option<String>,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
        }
    }
}

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for log files (defaults to the XDG state/cache dir)
    pub directory: Option<PathBuf>,
}

/// Complete configuration file
///
/// ```toml
/// [provider]
/// base_url = "https://generativelanguage.googleapis.com"
/// request_timeout_seconds = 60
///
/// [generation]
/// temperature = 0.7
///
/// [storage]
/// host = "file"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub provider: FileProviderConfig,
    pub generation: FileGenerationConfig,
    pub storage: FileStorageConfig,
    pub repl: FileReplConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.provider.request_timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBaseUrl);
        }

        let generation = &self.generation;
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(ConfigValidationError::InvalidTemperature(generation.temperature));
        }
        if !(0.0..=1.0).contains(&generation.top_p) {
            return Err(ConfigValidationError::InvalidTopP(generation.top_p));
        }
        if generation.max_output_tokens == 0 {
            return Err(ConfigValidationError::InvalidMaxOutputTokens);
        }

        Ok(())
    }

    /// Connection settings for the Gemini client factory.
    pub fn client_config(&self) -> GeminiClientConfig {
        GeminiClientConfig {
            base_url: self.provider.base_url.clone(),
            generation: GenerationConfig {
                temperature: self.generation.temperature,
                top_p: self.generation.top_p,
                top_k: self.generation.top_k,
                max_output_tokens: self.generation.max_output_tokens,
            },
            safety_settings: default_safety_settings(),
            request_timeout: Duration::from_secs(self.provider.request_timeout_seconds),
        }
    }
}
