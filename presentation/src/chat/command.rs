//! Slash commands understood by the chat REPL.

/// A parsed `/command`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Clear,
    /// Show the stored settings
    Settings,
    /// Show the masked key, or store a new one
    Key(Option<String>),
    /// Show models, or store a new one
    Model(Option<String>),
    /// Show, set or clear the stored system prompt
    System(SystemPromptAction),
    /// Probe the API with the current credentials
    Test,
    Quit,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemPromptAction {
    Show,
    Set(String),
    Clear,
}

impl ReplCommand {
    /// Parse a line. Returns `None` for ordinary messages.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let rest = line.strip_prefix('/')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };
        let arg = arg.map(str::to_string);

        let command = match name {
            "help" | "h" | "?" => ReplCommand::Help,
            "clear" | "new" => ReplCommand::Clear,
            "settings" => ReplCommand::Settings,
            "key" => ReplCommand::Key(arg),
            "model" | "models" => ReplCommand::Model(arg),
            "system" => ReplCommand::System(match arg.as_deref() {
                None => SystemPromptAction::Show,
                Some("clear") => SystemPromptAction::Clear,
                Some(_) => SystemPromptAction::Set(arg.unwrap_or_default()),
            }),
            "test" => ReplCommand::Test,
            "quit" | "exit" | "q" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        };
        Some(command)
    }
}

/// Lines printed by `/help`.
pub const HELP: &[(&str, &str)] = &[
    ("/help", "Show this help"),
    ("/clear", "Start a new conversation"),
    ("/settings", "Show stored settings"),
    ("/key <key>", "Store your Gemini API key"),
    ("/model [id]", "List models, or store the model to use"),
    ("/system [prompt|clear]", "Show, store or clear the system prompt"),
    ("/test", "Check the API key and connection"),
    ("/quit", "Exit"),
];
