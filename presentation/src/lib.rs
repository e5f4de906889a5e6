//! Presentation layer for sidechat
//!
//! This crate contains the CLI definition, the terminal chat view and
//! the interactive chat REPL.

pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use chat::{ChatRepl, CommandFlow, ReplCommand, TerminalChatView};
pub use cli::commands::{Cli, StorageHostArg};
pub use output::markdown::MarkdownRenderer;
