//! Error types for shellq
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for shellq operations
///
/// Configuration and credential failures are fatal before a session starts.
/// Connection failures are recoverable per query. Frame decode failures are
/// logged and skipped by the stream readers, and clipboard failures are
/// reported on the way out of the interactive session.
#[derive(Error, Debug)]
pub enum ShellqError {
    /// Configuration-related errors (unreadable or invalid config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The environment variable holding a model's credential is unset or empty
    #[error("Missing credentials for {provider}: ${env_var} is not set")]
    MissingCredentials {
        /// Human readable provider name
        provider: String,
        /// Name of the environment variable the config points at
        env_var: String,
    },

    /// Non-success status, transport failure or timeout talking to the model
    #[error("Connection error: {0}")]
    Connection(String),

    /// A single stream frame could not be decoded
    #[error("Frame decode error: {0}")]
    FrameDecode(String),

    /// Writing to the OS clipboard failed
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Terminal setup or drawing failed
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ShellqError {
    /// Returns true for errors that must stop the program before a session starts
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ShellqError::Config(_) | ShellqError::MissingCredentials { .. } | ShellqError::Yaml(_)
        )
    }

    /// Returns true for errors a session recovers from by accepting new input
    pub fn is_connection(&self) -> bool {
        matches!(self, ShellqError::Connection(_) | ShellqError::Http(_))
    }
}

/// Result type alias for shellq operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = ShellqError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_missing_credentials_error_display() {
        let error = ShellqError::MissingCredentials {
            provider: "OpenAI".to_string(),
            env_var: "OPENAI_API_KEY".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Missing credentials for OpenAI: $OPENAI_API_KEY is not set"
        );
    }

    #[test]
    fn test_connection_error_display() {
        let error = ShellqError::Connection("429 Too Many Requests".to_string());
        assert_eq!(error.to_string(), "Connection error: 429 Too Many Requests");
    }

    #[test]
    fn test_clipboard_error_display() {
        let error = ShellqError::Clipboard("no display".to_string());
        assert_eq!(error.to_string(), "Clipboard error: no display");
    }

    #[test]
    fn test_error_classification() {
        assert!(ShellqError::Config("x".into()).is_configuration());
        assert!(ShellqError::MissingCredentials {
            provider: "Gemini".into(),
            env_var: "GEMINI_API_KEY".into()
        }
        .is_configuration());
        assert!(!ShellqError::Connection("x".into()).is_configuration());
        assert!(ShellqError::Connection("x".into()).is_connection());
        assert!(!ShellqError::FrameDecode("x".into()).is_connection());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: ShellqError = io_error.into();
        assert!(matches!(error, ShellqError::Io(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: ShellqError = yaml_error.into();
        assert!(matches!(error, ShellqError::Yaml(_)));
        assert!(error.is_configuration());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ShellqError>();
    }
}
