//! Gemini `streamGenerateContent` provider
//!
//! The Gemini wire protocol has no system role and calls the assistant
//! `model`, so conversations are reshaped before sending.

use crate::config::ModelConfig;
use crate::error::{Result, ShellqError};
use crate::providers::base::{Credentials, DeltaMode, Message, Provider, Role};
use crate::providers::parse_endpoint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const GENERATE_SUFFIX: &str = ":generateContent";
const STREAM_SUFFIX: &str = ":streamGenerateContent";

/// Provider for Google Gemini models
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    endpoint: url::Url,
    temperature: f32,
}

#[derive(Debug, Serialize, PartialEq)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Default)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiProvider {
    /// Creates a provider for one configured model
    ///
    /// The endpoint is normalized to its streaming form and the API key is
    /// carried in the query string together with `alt=sse`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the endpoint is not a valid URL
    pub fn new(model: &ModelConfig, credentials: Credentials) -> Result<Self> {
        let mut endpoint = parse_endpoint(&streaming_endpoint(&model.endpoint))?;
        endpoint
            .query_pairs_mut()
            .append_pair("key", &credentials.api_key)
            .append_pair("alt", "sse");
        Ok(Self {
            endpoint,
            temperature: model.temperature,
        })
    }
}

fn streaming_endpoint(endpoint: &str) -> String {
    let base = endpoint
        .strip_suffix(STREAM_SUFFIX)
        .or_else(|| endpoint.strip_suffix(GENERATE_SUFFIX))
        .unwrap_or(endpoint);
    format!("{}{}", base, STREAM_SUFFIX)
}

/// Reshapes a conversation into Gemini turns
///
/// Leading system messages are joined and prepended to the first user turn.
/// System messages after that point have nowhere to go and are dropped.
/// Consecutive turns with the same role are merged.
fn to_contents(messages: &[Message]) -> Vec<GeminiContent> {
    let mut contents: Vec<GeminiContent> = Vec::new();
    let mut pending_system: Vec<&str> = Vec::new();
    let mut seen_user = false;

    for message in messages {
        let (role, text) = match message.role {
            Role::System if !seen_user => {
                pending_system.push(&message.content);
                continue;
            }
            Role::System => {
                tracing::warn!("Ignoring system message after the first user message");
                continue;
            }
            Role::User => {
                seen_user = true;
                if pending_system.is_empty() {
                    ("user", message.content.clone())
                } else {
                    let mut folded = pending_system.join("\n\n");
                    pending_system.clear();
                    folded.push_str("\n\n");
                    folded.push_str(&message.content);
                    ("user", folded)
                }
            }
            Role::Assistant => ("model", message.content.clone()),
        };

        match contents.last_mut() {
            Some(last) if last.role == role && !last.parts.is_empty() => {
                let part = &mut last.parts[0];
                part.text.push_str("\n\n");
                part.text.push_str(&text);
            }
            _ => contents.push(GeminiContent {
                role,
                parts: vec![GeminiPart { text }],
            }),
        }
    }

    contents
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn delta_mode(&self) -> DeltaMode {
        DeltaMode::Cumulative
    }

    fn build_request(
        &self,
        http: &reqwest::Client,
        messages: &[Message],
    ) -> Result<reqwest::Request> {
        let body = GeminiRequest {
            contents: to_contents(messages),
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        http.post(self.endpoint.clone())
            .json(&body)
            .build()
            .map_err(|e| {
                // The endpoint carries the API key in its query string
                ShellqError::Config(format!(
                    "Failed to build Gemini request: {}",
                    e.without_url()
                ))
                .into()
            })
    }

    fn decode_frame(&self, payload: &str) -> Result<Option<String>> {
        let chunk: StreamChunk = serde_json::from_str(payload)
            .map_err(|e| ShellqError::FrameDecode(format!("Gemini frame: {}", e)))?;
        Ok(chunk
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderKind;

    fn provider(endpoint: &str) -> GeminiProvider {
        let model = ModelConfig {
            name: "gemini-1.5-flash".to_string(),
            endpoint: endpoint.to_string(),
            provider: ProviderKind::Gemini,
            auth_env_var: "GEMINI_API_KEY".to_string(),
            org_env_var: None,
            project_env_var: None,
            temperature: 0.0,
            prompt: Vec::new(),
        };
        GeminiProvider::new(&model, Credentials::new("g-key")).unwrap()
    }

    #[test]
    fn test_streaming_endpoint_normalization() {
        let base = "https://host/v1beta/models/gemini-1.5-flash";
        assert_eq!(
            streaming_endpoint(&format!("{base}:generateContent")),
            format!("{base}:streamGenerateContent")
        );
        assert_eq!(
            streaming_endpoint(&format!("{base}:streamGenerateContent")),
            format!("{base}:streamGenerateContent")
        );
        assert_eq!(
            streaming_endpoint(base),
            format!("{base}:streamGenerateContent")
        );
    }

    #[test]
    fn test_request_url_carries_key_and_sse() {
        let p = provider("https://host/v1beta/models/gemini-1.5-flash:generateContent");
        let request = p
            .build_request(&reqwest::Client::new(), &[Message::user("hi")])
            .unwrap();
        assert_eq!(
            request.url().path(),
            "/v1beta/models/gemini-1.5-flash:streamGenerateContent"
        );
        assert_eq!(request.url().query(), Some("key=g-key&alt=sse"));
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn test_system_prompt_folded_into_first_user_turn() {
        let messages = vec![
            Message::system("be terse"),
            Message::system("use bash"),
            Message::user("print hi"),
            Message::assistant("```bash\necho hi\n```"),
            Message::system("late instruction"),
            Message::user("again"),
        ];
        let contents = to_contents(&messages);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[0].parts[0].text, "be terse\n\nuse bash\n\nprint hi");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[2].parts[0].text, "again");
    }

    #[test]
    fn test_consecutive_roles_are_merged() {
        let messages = vec![Message::user("one"), Message::user("two")];
        let contents = to_contents(&messages);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].parts[0].text, "one\n\ntwo");
    }

    #[test]
    fn test_request_body_shape() {
        let p = provider("https://host/v1beta/models/gemini-1.5-flash");
        let request = p
            .build_request(&reqwest::Client::new(), &[Message::user("hi")])
            .unwrap();
        let bytes = request.body().and_then(|b| b.as_bytes()).unwrap();
        let body: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
    }

    #[test]
    fn test_decode_frame() {
        let p = provider("https://host/v1beta/models/gemini-1.5-flash");
        let text = p
            .decode_frame(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"ls -la"}]}}]}"#)
            .unwrap();
        assert_eq!(text.as_deref(), Some("ls -la"));

        assert_eq!(p.decode_frame(r#"{"candidates":[]}"#).unwrap(), None);
        assert_eq!(
            p.decode_frame(r#"{"candidates":[{"finishReason":"STOP"}]}"#)
                .unwrap(),
            None
        );
        assert!(p.decode_frame("oops").is_err());
    }
}
