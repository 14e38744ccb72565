//! Provider module for shellq
//!
//! This module contains the streaming chat provider abstraction and its
//! OpenAI-style and Gemini-style implementations.

pub mod base;
pub mod gemini;
pub mod openai;
pub mod sse;

pub use base::{Credentials, DeltaMode, Message, Provider, Role};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use crate::config::ModelConfig;
use crate::error::{Result, ShellqError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Wire format spoken by a configured endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions, also used by Azure and compatible servers
    #[default]
    OpenAi,
    /// Google Gemini `streamGenerateContent`
    Gemini,
}

impl ProviderKind {
    /// Human readable name shown in messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Gemini",
        }
    }

    /// Parses a provider name from user input
    ///
    /// # Examples
    ///
    /// ```
    /// use shellq::providers::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::parse_str("Gemini"), Some(ProviderKind::Gemini));
    /// assert_eq!(ProviderKind::parse_str("claude"), None);
    /// ```
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAi),
            "gemini" => Some(ProviderKind::Gemini),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Gemini => write!(f, "gemini"),
        }
    }
}

/// Create a provider instance based on a model configuration
///
/// # Arguments
///
/// * `model` - Model configuration selecting the wire format and endpoint
/// * `credentials` - Secrets resolved from the environment
///
/// # Errors
///
/// Returns a configuration error if the endpoint is not a valid URL
pub fn create_provider(model: &ModelConfig, credentials: Credentials) -> Result<Arc<dyn Provider>> {
    tracing::debug!(
        provider = %model.provider,
        model = %model.name,
        "Creating provider"
    );
    match model.provider {
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiProvider::new(model, credentials)?)),
        ProviderKind::Gemini => Ok(Arc::new(GeminiProvider::new(model, credentials)?)),
    }
}

pub(crate) fn parse_endpoint(endpoint: &str) -> Result<url::Url> {
    url::Url::parse(endpoint).map_err(|e| {
        ShellqError::Config(format!("Invalid endpoint URL '{}': {}", endpoint, e)).into()
    })
}
