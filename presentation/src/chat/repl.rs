//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::{HELP, ReplCommand, SystemPromptAction};
use colored::Colorize;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use sidechat_application::{
    ChatSessionController, ClearOutcome, SendOutcome, SettingsError, SettingsEvent, SettingsStore,
};
use sidechat_domain::{ModelId, SettingsPatch, known_keys, mask_api_key};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

const HISTORY_CAPACITY: usize = 1000;

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFlow {
    Continue,
    Exit,
}

/// Interactive chat REPL
pub struct ChatRepl {
    controller: Arc<ChatSessionController>,
    settings: Arc<SettingsStore>,
    history_path: Option<PathBuf>,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(controller: Arc<ChatSessionController>, settings: Arc<SettingsStore>) -> Self {
        Self {
            controller,
            settings,
            history_path: Self::default_history_path(),
        }
    }

    /// Use `path` for line history (`None` disables it)
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    pub fn default_history_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("sidechat").join("history.txt"))
    }

    fn line_editor(&self) -> Reedline {
        let editor = Reedline::create();
        let Some(path) = &self.history_path else {
            return editor;
        };

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!("History disabled ({}): {}", path.display(), e);
                editor
            }
        }
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> std::io::Result<()> {
        let mut line_editor = self.line_editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("sidechat".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome().await;

        loop {
            match line_editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();

                    // Skip empty lines
                    if line.is_empty() {
                        continue;
                    }

                    if let Some(command) = ReplCommand::parse(line) {
                        if self.handle_command(command).await == CommandFlow::Exit {
                            break;
                        }
                        continue;
                    }

                    self.send(line).await;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
                _ => {
                    println!("^C");
                }
            }
        }

        Ok(())
    }

    /// Send one message, cancelling it if Ctrl-C arrives first.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let send = self.controller.send(text);
        tokio::pin!(send);

        loop {
            tokio::select! {
                outcome = &mut send => return outcome,
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        warn!("Ctrl-C handler unavailable: {}", e);
                        return send.await;
                    }
                    if self.controller.cancel() {
                        debug!("Cancellation requested");
                    }
                }
            }
        }
    }

    async fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│            sidechat - Gemini Chat           │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Model: {}", self.controller.model().to_string().cyan());
        if let Some(prompt) = self.controller.system_prompt() {
            println!("System prompt: {}", prompt.dimmed());
        }

        match self.settings.get_settings().await {
            Ok(settings) if !settings.has_api_key() => {
                println!(
                    "{}",
                    "No API key stored. Add one with /key <your Gemini API key>.".yellow()
                );
            }
            Ok(_) => {}
            Err(e) => println!("{} {}", "Could not read settings:".red(), e),
        }

        println!();
        println!("Type /help for commands. Ctrl-C stops a reply, Ctrl-D exits.");
        println!();
    }

    /// Handle a slash command.
    pub async fn handle_command(&self, command: ReplCommand) -> CommandFlow {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return CommandFlow::Exit;
            }
            ReplCommand::Help => {
                println!();
                println!("Commands:");
                for (usage, description) in HELP {
                    println!("  {:<24} - {}", usage, description);
                }
                println!();
            }
            ReplCommand::Clear => {
                if self.controller.clear() == ClearOutcome::Busy {
                    println!("A reply is still streaming; stop it with Ctrl-C first.");
                }
            }
            ReplCommand::Settings => self.show_settings().await,
            ReplCommand::Key(None) => match self.settings.get_settings().await {
                Ok(settings) => println!("API key: {}", mask_api_key(&settings.api_key)),
                Err(e) => println!("{} {}", "Error:".red(), e),
            },
            ReplCommand::Key(Some(key)) => {
                self.save(SettingsPatch::new().with_api_key(key), "API key saved.")
                    .await;
            }
            ReplCommand::Model(None) => {
                let current = self.controller.model();
                println!("Models:");
                for model in ModelId::known_models() {
                    let marker = if model == current { "*" } else { " " };
                    println!("  {} {}", marker.green(), model);
                }
                if current.is_custom() {
                    println!("  {} {} (custom)", "*".green(), current);
                }
            }
            ReplCommand::Model(Some(id)) => {
                let model: ModelId = id.parse().unwrap_or_default();
                let message = format!("Model set to {}.", model);
                self.save(SettingsPatch::new().with_model(model), &message)
                    .await;
            }
            ReplCommand::System(SystemPromptAction::Show) => {
                match self.controller.system_prompt() {
                    Some(prompt) => println!("System prompt: {}", prompt),
                    None => println!("No system prompt set."),
                }
            }
            ReplCommand::System(SystemPromptAction::Set(prompt)) => {
                self.save(
                    SettingsPatch::new().with_system_prompt(prompt),
                    "System prompt saved. It applies from the next message.",
                )
                .await;
            }
            ReplCommand::System(SystemPromptAction::Clear) => {
                self.save(
                    SettingsPatch::new().with_system_prompt(""),
                    "System prompt cleared.",
                )
                .await;
            }
            ReplCommand::Test => {
                println!("Testing connection...");
                if self.controller.test_connection().await {
                    println!("{} Connected to Gemini.", "✓".green());
                } else {
                    println!(
                        "{} Connection failed. Check your API key and network.",
                        "✗".red()
                    );
                }
            }
            ReplCommand::Unknown(line) => {
                println!("Unknown command: {}", line);
                println!("Type /help for available commands");
            }
        }
        CommandFlow::Continue
    }

    async fn show_settings(&self) {
        let settings = match self.settings.get_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                println!("{} {}", "Error:".red(), e);
                return;
            }
        };

        println!();
        for info in known_keys() {
            let value = match info.storage_name {
                "apiKey" => mask_api_key(&settings.api_key),
                "model" => settings.model.to_string(),
                "systemPrompt" => settings
                    .system_prompt()
                    .map(str::to_string)
                    .unwrap_or_else(|| "(none)".to_string()),
                _ => format!("{} field(s)", settings.extra.len()),
            };
            println!(
                "  {:<14} {}  {}",
                info.storage_name.bold(),
                value,
                format!("# {}", info.description).dimmed()
            );
        }
        println!();
    }

    async fn save(&self, patch: SettingsPatch, success: &str) {
        match self.settings.save_settings(patch).await {
            Ok(_) => {
                // Apply now instead of waiting for the broadcast.
                if let Err(e) = self
                    .controller
                    .handle_settings_event(SettingsEvent::SettingsUpdated)
                    .await
                {
                    warn!("Failed to reload settings: {}", e);
                }
                println!("{}", success.green());
            }
            Err(SettingsError::InvalidApiKey(e)) => println!("{} {}", "Invalid API key:".red(), e),
            Err(e) => println!("{} {}", "Could not save settings:".red(), e),
        }
    }
}
