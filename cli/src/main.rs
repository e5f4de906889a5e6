//! CLI entrypoint for sidechat
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::Parser;
use sidechat_application::{ChatSessionController, SendOutcome, SettingsStore};
use sidechat_domain::ModelId;
use sidechat_infrastructure::{
    CallbackHost, ConfigLoader, FileConfig, GeminiClientFactory, JsonFileHost, MemoryCallbackHost,
    PlatformKeyValueStore, PromiseHost, StorageHostKind, detect_platform,
};
use sidechat_presentation::{ChatRepl, Cli, StorageHostArg, TerminalChatView};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "sidechat.log";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())?
    };

    // Keep the guard alive so buffered log lines are flushed on exit.
    let _log_guard = init_logging(cli.verbose, &config);

    info!("Starting sidechat");

    // === Dependency Injection ===
    let storage_host = match cli.storage {
        Some(StorageHostArg::File) => StorageHostKind::File,
        Some(StorageHostArg::Memory) => StorageHostKind::Memory,
        None => config.storage.host,
    };

    let (promise_host, callback_host): (
        Option<Arc<dyn PromiseHost>>,
        Option<Arc<dyn CallbackHost>>,
    ) = match storage_host {
        StorageHostKind::File => {
            let path = match config.storage.path.as_deref() {
                Some(path) => expand_home(path),
                None => JsonFileHost::default_path(),
            }
            .context("No data directory found; set [storage] path in the config file")?;
            info!("Settings file: {}", path.display());
            let host: Arc<dyn PromiseHost> = Arc::new(JsonFileHost::new(path));
            (Some(host), None)
        }
        StorageHostKind::Memory => {
            let host: Arc<dyn CallbackHost> = Arc::new(MemoryCallbackHost::new());
            (None, Some(host))
        }
    };
    let platform = detect_platform(promise_host, callback_host)?;

    let settings = Arc::new(SettingsStore::new(Arc::new(PlatformKeyValueStore::new(
        Arc::clone(&platform),
    ))));
    let factory = Arc::new(GeminiClientFactory::new(config.client_config()));
    let view = Arc::new(TerminalChatView::stdout(
        !cli.quiet && config.repl.show_progress,
    ));

    let controller =
        Arc::new(ChatSessionController::load(factory, Arc::clone(&settings), view).await?);
    if let Some(model) = &cli.model {
        let model: ModelId = model.parse().unwrap_or_default();
        info!("Model override: {}", model);
        controller.set_model(model);
    }
    if let Some(prompt) = cli.system_prompt {
        controller.set_system_prompt(Some(prompt));
    }
    let _settings_watch = controller.watch_settings(settings.subscribe());

    let repl = ChatRepl::new(Arc::clone(&controller), Arc::clone(&settings))
        .with_history_file(history_path(&config));

    // Single question mode
    if let Some(question) = cli.question {
        return Ok(match repl.send(&question).await {
            SendOutcome::Responded(_) => ExitCode::SUCCESS,
            // The view has already shown the error.
            SendOutcome::Failed(_) => ExitCode::FAILURE,
            SendOutcome::Ignored => {
                eprintln!("Question is empty.");
                ExitCode::FAILURE
            }
        });
    }

    platform.open_panel().await?;
    repl.run().await?;

    Ok(ExitCode::SUCCESS)
}

/// Install the tracing subscriber.
///
/// Logs go to a file so they do not interleave with the chat output;
/// stderr is the fallback when no log directory is available.
fn init_logging(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    // Initialize logging based on verbosity level
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let directory = config
        .logging
        .directory
        .clone()
        .or_else(|| dirs::cache_dir().map(|d| d.join("sidechat")))
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());

    match directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

/// Line history location: `[repl] history_file` with `~` expanded, or
/// the default under the data dir.
fn history_path(config: &FileConfig) -> Option<PathBuf> {
    match config.repl.history_file.as_deref() {
        Some(path) => expand_home(Path::new(path)),
        None => ChatRepl::default_history_path(),
    }
}

/// Resolve a leading `~` against the home directory.
fn expand_home(path: &Path) -> Option<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map(|home| home.join(rest)),
        Err(_) => Some(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(
            expand_home(Path::new("~/.local/share/sidechat/storage.json")),
            Some(home.join(".local/share/sidechat/storage.json"))
        );
        assert_eq!(
            expand_home(Path::new("/tmp/storage.json")),
            Some(PathBuf::from("/tmp/storage.json"))
        );
        assert_eq!(
            expand_home(Path::new("~user/x")),
            Some(PathBuf::from("~user/x"))
        );
    }

    #[test]
    fn test_history_path_expands_home() {
        let mut config = FileConfig::default();
        config.repl.history_file = Some("~/.sidechat_history".to_string());
        assert_eq!(
            history_path(&config),
            dirs::home_dir().map(|home| home.join(".sidechat_history"))
        );
    }
}
