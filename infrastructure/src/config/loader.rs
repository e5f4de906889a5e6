//! Configuration file loader with multi-source merging

use super::file_config::{ConfigValidationError, FileConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Project-level config file name
const PROJECT_CONFIG_FILE: &str = "sidechat.toml";

/// Prefix for environment overrides, e.g. `SIDECHAT_PROVIDER__BASE_URL`
const ENV_PREFIX: &str = "SIDECHAT_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigValidationError),
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `SIDECHAT_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./sidechat.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/sidechat/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(project_path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&project_path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: FileConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a single file on top of the defaults, ignoring every other
    /// source.
    pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let config: FileConfig = Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/sidechat/config.toml if set,
    /// otherwise falls back to ~/.config/sidechat/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sidechat").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        let path = PathBuf::from(PROJECT_CONFIG_FILE);
        path.exists().then_some(path)
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");

        let found = |exists: bool| if exists { "[FOUND]" } else { "[     ]" };

        println!("  [     ] Env:     {}*", ENV_PREFIX);

        if let Some(path) = config_path {
            println!("  {} Explicit: {}", found(path.exists()), path.display());
        }

        match Self::project_config_path() {
            Some(path) => println!("  [FOUND] Project: {}", path.display()),
            None => println!("  [     ] Project: ./{}", PROJECT_CONFIG_FILE),
        }

        if let Some(path) = Self::global_config_path() {
            println!("  {} Global:  {}", found(path.exists()), path.display());
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageHostKind;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.provider.request_timeout_seconds, 60);
        assert_eq!(config.storage.host, StorageHostKind::File);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        // Should return a path (even if file doesn't exist)
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("sidechat"));
    }

    #[test]
    fn test_load_file_merges_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nhost = \"memory\"\n\n[generation]\ntop_k = 8").unwrap();

        let config = ConfigLoader::load_file(file.path()).unwrap();
        assert_eq!(config.storage.host, StorageHostKind::Memory);
        assert_eq!(config.generation.top_k, 8);
        assert_eq!(config.generation.max_output_tokens, 8192);
    }

    #[test]
    fn test_load_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[provider]\nrequest_timeout_seconds = 0").unwrap();

        let err = ConfigLoader::load_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ConfigValidationError::InvalidTimeout)));
    }

    #[test]
    fn test_load_file_reports_type_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nhost = \"cloud\"").unwrap();

        assert!(matches!(
            ConfigLoader::load_file(file.path()),
            Err(ConfigError::Load(_))
        ));
    }
}
