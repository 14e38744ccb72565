//! Configuration file management commands

use crate::cli::ConfigAction;
use crate::config::ConfigStore;
use crate::error::{Result, ShellqError};
use colored::Colorize;
use std::io::{self, BufRead, Write};

/// Runs one configuration action
///
/// `show` and `default` load the file. The other actions work even when it
/// is broken.
///
/// # Errors
///
/// Returns a configuration error when the file cannot be read or written,
/// when there is no backup to revert to, or when an unknown model is made
/// the default
pub fn run_config(store: &ConfigStore, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = store.load()?;
            let default = config.select_model(None)?.name.clone();
            println!("{} {}", "Config file:".bold(), store.path().display());
            println!("{}", "Models:".bold());
            for model in &config.models {
                let marker = if model.name == default { "*" } else { " " };
                println!(
                    "  {} {} ({}, ${})",
                    marker,
                    model.name,
                    model.provider.display_name(),
                    model.auth_env_var
                );
            }
            println!("{} {}", "Default model:".bold(), default);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
        ConfigAction::Reset => {
            let question = format!(
                "Reset {} to the default configuration?",
                store.path().display()
            );
            if confirm(&question, io::stdin().lock())? {
                store.reset()?;
                println!("{}", "Configuration reset to default.".green());
            } else {
                println!("Aborted.");
            }
            Ok(())
        }
        ConfigAction::Revert => {
            let question = format!(
                "Replace {} with the last configuration that loaded successfully?",
                store.path().display()
            );
            if confirm(&question, io::stdin().lock())? {
                store.revert()?;
                println!("{}", "Configuration reverted from backup.".green());
            } else {
                println!("Aborted.");
            }
            Ok(())
        }
        ConfigAction::SetDefault(name) => {
            set_default_model(store, &name)?;
            println!("Default model set to {}.", name.bold());
            Ok(())
        }
    }
}

/// Makes `name` the default model and saves the configuration
///
/// # Errors
///
/// Returns a configuration error when the file is invalid or `name` is not
/// a configured model
pub fn set_default_model(store: &ConfigStore, name: &str) -> Result<()> {
    let mut config = store.load()?;
    if config.model(name).is_none() {
        return Err(ShellqError::Config(format!(
            "Unknown model '{}'. Configured models: {}",
            name,
            config.model_names().join(", ")
        ))
        .into());
    }
    config.preferences.default_model = name.to_string();
    store.save(&config)
}

/// Asks a yes/no question, defaulting to no
pub fn confirm(question: &str, mut input: impl BufRead) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
