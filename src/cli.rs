//! Command-line interface definition for `q`
//!
//! Everything after the options is the request. A request whose first word
//! is `config` manages the configuration file instead of asking a question.

use clap::Parser;
use std::path::PathBuf;

/// q - turn a description into a shell command
///
/// Ask for a command in plain language, refine it with follow-ups, then
/// press Enter on an empty prompt to copy it and quit.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "q")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "Q_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model to use instead of the configured default
    #[arg(short, long)]
    pub model: Option<String>,

    /// Print the reply to stdout and exit instead of starting a session
    #[arg(short, long)]
    pub print: bool,

    /// Write logs to this file
    #[arg(long, env = "Q_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// What you want to do, or `config [show|path|reset|revert|default <NAME>]`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub request: Vec<String>,
}

/// Operation on the configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the file contents
    Show,
    /// Print the file location
    Path,
    /// Replace the file with the built-in default
    Reset,
    /// Restore the last configuration that loaded successfully
    Revert,
    /// Make the named model the default
    SetDefault(String),
}

/// What a command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Ask a question, optionally starting with the given request
    Ask(Option<String>),
    /// Manage the configuration
    Config(ConfigAction),
    /// A `config` command that could not be understood
    Invalid(String),
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Interprets the positional words
    pub fn invocation(&self) -> Invocation {
        let words: Vec<&str> = self.request.iter().map(String::as_str).collect();
        match words.as_slice() {
            [] => Invocation::Ask(None),
            ["config"] | ["config", "show"] => Invocation::Config(ConfigAction::Show),
            ["config", "path"] => Invocation::Config(ConfigAction::Path),
            ["config", "reset"] => Invocation::Config(ConfigAction::Reset),
            ["config", "revert"] => Invocation::Config(ConfigAction::Revert),
            ["config", "default", name] => {
                Invocation::Config(ConfigAction::SetDefault(name.to_string()))
            }
            ["config", ..] => Invocation::Invalid(format!(
                "Unknown config command '{}'. Expected show, path, reset, revert or default <NAME>",
                words[1..].join(" ")
            )),
            _ => {
                let request = words.join(" ");
                if request.trim().is_empty() {
                    Invocation::Ask(None)
                } else {
                    Invocation::Ask(Some(request))
                }
            }
        }
    }
}
