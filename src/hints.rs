//! User-facing remediation messages
//!
//! Connection hints are shown inside the interactive view. Credential and
//! configuration messages are printed before any session starts.

use crate::providers::ProviderKind;
use colored::Colorize;
use std::path::Path;

const OPENAI_BILLING_URL: &str = "https://platform.openai.com/account/billing";
const OPENAI_KEYS_URL: &str = "https://platform.openai.com/account/api-keys";
const GEMINI_API_URL: &str =
    "https://console.cloud.google.com/apis/library/generativelanguage.googleapis.com";
const GEMINI_KEYS_URL: &str = "https://console.cloud.google.com/apis/credentials";

/// Actionable suggestion attached to a connection error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionHint {
    /// What the user should do
    pub message: &'static str,
    /// Where to do it
    pub link: &'static str,
}

/// Returns true when an error text looks like a quota or billing refusal
pub fn is_likely_billing_error(error: &str) -> bool {
    error.contains("429 Too Many Requests")
}

/// Chooses a hint for a failed query against `provider`
///
/// # Examples
///
/// ```
/// use shellq::hints::connection_hint;
///
/// let hint = connection_hint("OpenAI", "API request failed: 429 Too Many Requests").unwrap();
/// assert!(hint.link.contains("billing"));
/// assert!(connection_hint("OpenAI", "connection refused").is_none());
/// ```
pub fn connection_hint(provider: &str, error: &str) -> Option<ConnectionHint> {
    match ProviderKind::parse_str(provider)? {
        ProviderKind::OpenAi if is_likely_billing_error(error) => Some(ConnectionHint {
            message: "You may need to set up OpenAI billing. You can do so here:",
            link: OPENAI_BILLING_URL,
        }),
        ProviderKind::OpenAi => None,
        ProviderKind::Gemini => Some(ConnectionHint {
            message: "Ensure the Generative Language API is enabled in your Google Cloud project and the API key is valid.",
            link: GEMINI_API_URL,
        }),
    }
}

/// Step-by-step instructions for setting a missing API key
///
/// # Arguments
///
/// * `provider` - Provider the key belongs to
/// * `env_var` - Variable the configuration reads the key from
/// * `windows` - Use PowerShell syntax and profile names
pub fn credential_instructions(provider: ProviderKind, env_var: &str, windows: bool) -> String {
    let (set_key, profile) = if windows {
        (format!("$env:{} = \"[your key]\"", env_var), "$profile")
    } else {
        (format!("export {}=[your key]", env_var), ".zshrc or .bashrc")
    };

    let mut steps: Vec<String> = match provider {
        ProviderKind::OpenAi => vec![
            format!("Generate your API key at {}", OPENAI_KEYS_URL),
            "Add your credit card in the API (for the free trial)".to_string(),
        ],
        ProviderKind::Gemini => vec![
            format!("Create an API key in your Google Cloud project: {}", GEMINI_KEYS_URL),
            format!("Ensure the Generative Language API is enabled: {}", GEMINI_API_URL),
        ],
    };
    steps.push(format!("Set your key by running:\n\n       {}\n", set_key));
    steps.push(format!("(Recommended) Add that ^ line to your {} file.", profile));

    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("  {}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prints the missing credential message to stderr
pub fn print_missing_credentials(provider: ProviderKind, env_var: &str) {
    eprintln!(
        "\n  {}\n\n{}\n",
        format!("{} environment variable not set.", env_var).red(),
        credential_instructions(provider, env_var, cfg!(windows))
    );
}

/// Options offered when the configuration file cannot be loaded
pub fn config_error_options(path: &Path) -> String {
    format!(
        "  Options:\n\n  \
         1. Run `q config revert` to load the automatic backup.\n  \
         2. Run `q config reset` to reset the config to default.\n  \
         3. Take a look at the config and fix the errors. It's at:\n\n       {}\n",
        path.display()
    )
}

/// Prints the configuration failure message to stderr
pub fn print_config_error(error: &anyhow::Error, path: &Path) {
    eprintln!(
        "\n  {}\n\n  {}\n\n{}",
        "Failed to load config file.".red(),
        error.to_string().dimmed(),
        config_error_options(path)
    );
}

/// Suggestion appended to other configuration failures
pub fn configuration_hint(path: &Path) -> String {
    format!(
        "Run `q config` to list the configured models, or edit the config at:\n\n       {}",
        path.display()
    )
}

/// Prints a configuration failure found after the file loaded
pub fn print_configuration_failure(error: &anyhow::Error, path: &Path) {
    eprintln!("{} {}", "Error:".red(), error);
    eprintln!("\n  {}", configuration_hint(path).dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_hint_names_command_and_path() {
        let hint = configuration_hint(Path::new("/home/me/.config/q/config.yaml"));
        assert!(hint.contains("`q config`"));
        assert!(hint.ends_with("/home/me/.config/q/config.yaml"));
    }

    #[test]
    fn test_billing_hint_only_for_openai_429() {
        let hint = connection_hint("OpenAI", "API request failed: 429 Too Many Requests");
        assert_eq!(hint.unwrap().link, OPENAI_BILLING_URL);
        assert!(connection_hint("OpenAI", "API request failed: 500 Internal Server Error").is_none());
    }

    #[test]
    fn test_gemini_always_gets_api_hint() {
        let hint = connection_hint("Gemini", "API request failed: 403 Forbidden").unwrap();
        assert_eq!(hint.link, GEMINI_API_URL);
    }

    #[test]
    fn test_unknown_provider_has_no_hint() {
        assert!(connection_hint("Other", "429 Too Many Requests").is_none());
    }

    #[test]
    fn test_credential_instructions_unix() {
        let text = credential_instructions(ProviderKind::OpenAi, "OPENAI_API_KEY", false);
        assert!(text.contains(OPENAI_KEYS_URL));
        assert!(text.contains("export OPENAI_API_KEY=[your key]"));
        assert!(text.contains(".zshrc or .bashrc"));
        assert!(text.contains("  4. (Recommended)"));
    }

    #[test]
    fn test_credential_instructions_windows() {
        let text = credential_instructions(ProviderKind::Gemini, "GEMINI_API_KEY", true);
        assert!(text.contains(GEMINI_KEYS_URL));
        assert!(text.contains("$env:GEMINI_API_KEY = \"[your key]\""));
        assert!(text.contains("$profile"));
    }

    #[test]
    fn test_config_error_options_mention_commands_and_path() {
        let text = config_error_options(Path::new("/home/u/.config/shellq/config.yaml"));
        assert!(text.contains("q config revert"));
        assert!(text.contains("q config reset"));
        assert!(text.contains("/home/u/.config/shellq/config.yaml"));
    }
}
