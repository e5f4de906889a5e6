//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Where settings are stored for this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageHostArg {
    /// JSON file on disk (promise-native host)
    File,
    /// In memory; nothing survives the process (callback-based host)
    Memory,
}

/// CLI arguments for sidechat
#[derive(Parser, Debug)]
#[command(name = "sidechat")]
#[command(author, version, about = "Chat with Google Gemini from a side panel in your terminal")]
#[command(long_about = r#"
sidechat opens a chat panel backed by the Gemini API. Replies stream in as
they are generated; press Ctrl-C to stop a reply.

Store your API key once with `/key <key>` inside the chat, or pass a question
on the command line for a single answer.

Configuration files are loaded from (in priority order):
1. SIDECHAT_* environment variables
2. --config <path>     Explicit config file
3. ./sidechat.toml     Project-level config
4. ~/.config/sidechat/config.toml   Global config

Example:
  sidechat
  sidechat "Explain Rust lifetimes in two sentences"
  sidechat --model gemini-1.5-pro --system-prompt "be terse"
"#)]
pub struct Cli {
    /// Ask one question, print the answer and exit
    pub question: Option<String>,

    /// Model for this session (overrides the stored model)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// System prompt for this session (overrides the stored prompt)
    #[arg(short, long, value_name = "PROMPT")]
    pub system_prompt: Option<String>,

    /// Settings storage host (overrides `[storage] host`)
    #[arg(long, value_enum, value_name = "HOST")]
    pub storage: Option<StorageHostArg>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
