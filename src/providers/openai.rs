//! OpenAI-style chat completions provider
//!
//! Also covers Azure OpenAI deployments and self-hosted servers that speak
//! the same streaming protocol.

use crate::config::ModelConfig;
use crate::error::{Result, ShellqError};
use crate::providers::base::{Credentials, DeltaMode, Message, Provider};
use crate::providers::parse_endpoint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const AZURE_HOST_MARKER: &str = "openai.azure.com";

/// Provider for `/v1/chat/completions` style endpoints
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    endpoint: url::Url,
    model: String,
    temperature: f32,
    credentials: Credentials,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Creates a provider for one configured model
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the endpoint is not a valid URL
    pub fn new(model: &ModelConfig, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            endpoint: parse_endpoint(&model.endpoint)?,
            model: model.name.clone(),
            temperature: model.temperature,
            credentials,
        })
    }

    fn is_azure(&self) -> bool {
        self.endpoint
            .host_str()
            .is_some_and(|host| host.contains(AZURE_HOST_MARKER))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    fn delta_mode(&self) -> DeltaMode {
        DeltaMode::Incremental
    }

    fn build_request(
        &self,
        http: &reqwest::Client,
        messages: &[Message],
    ) -> Result<reqwest::Request> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            stream: true,
        };

        let mut request = http.post(self.endpoint.clone()).json(&body);
        request = if self.is_azure() {
            request.header("api-key", &self.credentials.api_key)
        } else {
            request.bearer_auth(&self.credentials.api_key)
        };
        if let Some(org) = &self.credentials.organization {
            request = request.header("OpenAI-Organization", org);
        }
        if let Some(project) = &self.credentials.project {
            request = request.header("OpenAI-Project", project);
        }

        request.build().map_err(|e| {
            ShellqError::Config(format!(
                "Failed to build OpenAI request: {}",
                e.without_url()
            ))
            .into()
        })
    }

    fn decode_frame(&self, payload: &str) -> Result<Option<String>> {
        let chunk: ChatChunk = serde_json::from_str(payload)
            .map_err(|e| ShellqError::FrameDecode(format!("OpenAI frame: {}", e)))?;
        Ok(chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content))
    }
}
