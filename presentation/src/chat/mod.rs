//! Interactive chat module
//!
//! Provides a line-editor based chat interface and the terminal view the
//! session controller renders into.

mod command;
mod repl;
mod view;

pub use command::{HELP, ReplCommand, SystemPromptAction};
pub use repl::{ChatRepl, CommandFlow};
pub use view::TerminalChatView;
