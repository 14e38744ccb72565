//! shellq - the library behind the `q` command
//!
//! `q` turns a plain-language request into a shell command by asking a
//! hosted language model, streams the answer into the terminal, and copies
//! the first fenced code block to the clipboard when the user is done.
//!
//! # Architecture
//!
//! - `code_block`: extraction of the first fenced code block from a reply
//! - `providers`: OpenAI and Gemini request building and stream decoding
//! - `session`: fragment accumulation, streaming queries, conversation history
//! - `tui`: the interactive state machine and its terminal front end
//! - `config`: configuration file, model selection and credentials
//! - `cli` and `commands`: argument parsing and top-level handlers
//!
//! # Example
//!
//! ```
//! use shellq::code_block::extract_first_code_block;
//!
//! let reply = "```bash\nls -la\n```";
//! let block = extract_first_code_block(reply);
//! assert_eq!(block.content, "ls -la");
//! assert!(block.is_pure_code);
//! ```

pub mod cli;
pub mod clipboard;
pub mod code_block;
pub mod commands;
pub mod config;
pub mod error;
pub mod hints;
pub mod logging;
pub mod providers;
pub mod session;
pub mod tui;

// Re-export commonly used types
pub use config::{AppConfig, ConfigStore};
pub use error::{Result, ShellqError};
