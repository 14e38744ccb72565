//! q - shell commands from plain language
//!
#![doc = "Main entry point for the q command."]

use std::process::ExitCode;

use shellq::cli::{Cli, Invocation};
use shellq::clipboard;
use shellq::commands;
use shellq::commands::ask::AskOptions;
use shellq::config::{ConfigStore, LoggingConfig};
use shellq::hints;
use shellq::logging;
use shellq::ShellqError;

#[tokio::main]
async fn main() -> ExitCode {
    // Background copy started by a previous `q` to keep the selection alive
    if clipboard::is_selection_holder() {
        let held = tokio::task::spawn_blocking(|| clipboard::hold_selection(std::io::stdin().lock()))
            .await;
        return match held {
            Ok(Ok(())) => ExitCode::SUCCESS,
            _ => ExitCode::FAILURE,
        };
    }

    let cli = Cli::parse_args();

    let store = match &cli.config {
        Some(path) => ConfigStore::new(path),
        None => match ConfigStore::default_location() {
            Ok(store) => store,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    let result = match cli.invocation() {
        Invocation::Config(action) => {
            start_logging(&LoggingConfig::default(), &cli, cli.verbose);
            commands::config::run_config(&store, action)
        }
        Invocation::Invalid(message) => Err(ShellqError::Config(message).into()),
        Invocation::Ask(request) => {
            let created = store.ensure_exists();
            let config = match store.load() {
                Ok(config) => config,
                Err(e) => {
                    hints::print_config_error(&e, store.path());
                    return ExitCode::FAILURE;
                }
            };
            // The session owns the terminal, so stderr logging needs an explicit opt-in
            start_logging(&config.logging, &cli, cli.verbose && cli.print);
            if let Ok(true) = created {
                tracing::info!(path = %store.path().display(), "Created default configuration");
            }
            if let Err(e) = store.mark_known_good() {
                tracing::warn!(error = %e, "Failed to back up the configuration");
                eprintln!("Warning: failed to back up the configuration: {}", e);
            }
            tracing::debug!(config = %store.path().display(), "Configuration loaded");

            let options = AskOptions {
                model: cli.model.clone(),
                request,
                print: cli.print,
            };
            commands::ask::run_ask(config, options).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            match e.downcast_ref::<ShellqError>() {
                Some(ShellqError::MissingCredentials { provider, env_var }) => {
                    let kind = shellq::providers::ProviderKind::parse_str(provider)
                        .unwrap_or_default();
                    hints::print_missing_credentials(kind, env_var);
                }
                Some(error) if error.is_configuration() => {
                    hints::print_configuration_failure(&e, store.path());
                }
                _ => eprintln!("Error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn start_logging(config: &LoggingConfig, cli: &Cli, allow_stderr: bool) {
    if let Err(e) = logging::init_logging(config, cli.log_file.as_deref(), allow_stderr) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }
}
