//! Asking the model for a command

use crate::config::{AppConfig, ModelConfig};
use crate::error::{Result, ShellqError};
use crate::providers::{create_provider, Message};
use crate::session::{ConversationSession, LlmClient};
use crate::tui;
use std::io::Write;
use std::time::Duration;

/// How the reply is presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskOptions {
    /// Model override from `--model`
    pub model: Option<String>,
    /// Request given on the command line
    pub request: Option<String>,
    /// Stream the reply to stdout and exit
    pub print: bool,
}

/// Builds a client for `model`
///
/// # Errors
///
/// Returns `MissingCredentials` when the model's API key is not set, and a
/// configuration error for a malformed endpoint
pub fn build_client(config: &AppConfig, model: &ModelConfig) -> Result<LlmClient> {
    let credentials = model.resolve_credentials()?;
    let provider = create_provider(model, credentials)?;
    LlmClient::new(
        provider,
        Duration::from_secs(config.preferences.request_timeout_seconds),
    )
}

/// Runs the ask command
///
/// # Errors
///
/// Returns configuration and credential errors before anything is sent. In
/// print mode a failed query is returned as an error. In the interactive
/// session it is shown inline instead.
pub async fn run_ask(config: AppConfig, options: AskOptions) -> Result<()> {
    let model = config.select_model(options.model.as_deref())?;
    tracing::info!(model = %model.name, provider = %model.provider, "Selected model");

    let client = build_client(&config, model)?;
    let prompt = model.prompt.clone();

    match (options.print, options.request) {
        (true, Some(request)) => print_reply(client, prompt, &request).await,
        (true, None) => Err(ShellqError::Config(
            "--print needs a request, for example: q -p list files by size".to_string(),
        )
        .into()),
        (false, request) => tui::run_interactive(client, prompt, request).await,
    }
}

/// Streams one reply to stdout as it arrives
///
/// A failed write to stdout (a closed pipe, for example) ends the command
/// with that error once the stream finishes.
async fn print_reply(
    client: LlmClient,
    prompt: Vec<Message>,
    request: &str,
) -> Result<()> {
    let mut session = ConversationSession::new(client, prompt);
    let mut stdout = std::io::stdout();
    let mut printed = 0usize;
    let mut write_error: Option<std::io::Error> = None;

    let reply = session
        .query(request, |text| {
            if write_error.is_some() {
                return;
            }
            // Every update extends the previous one, so only the new suffix is written
            if let Err(e) = write_suffix(&mut stdout, text, printed) {
                tracing::warn!(error = %e, "Failed to write reply to stdout");
                write_error = Some(e);
            }
            printed = text.len();
        })
        .await?;

    if let Some(e) = write_error {
        return Err(e.into());
    }
    if !reply.ends_with('\n') {
        writeln!(stdout)?;
    }
    tracing::debug!(turns = session.conversation().turns(), "Print mode finished");
    Ok(())
}

fn write_suffix(out: &mut impl Write, text: &str, printed: usize) -> std::io::Result<()> {
    out.write_all(text[printed..].as_bytes())?;
    out.flush()
}
