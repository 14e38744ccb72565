//! Base provider trait and common types for shellq
//!
//! This module defines the Provider trait that both wire formats implement,
//! along with the conversation message types they translate.

use crate::error::{Result, ShellqError};
use crate::providers::sse::{SseDecoder, SseFrame};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the conversation
    System,
    /// Text typed by the person at the terminal
    User,
    /// Reply produced by the model
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Message structure for conversation
///
/// Messages are replayed verbatim, in order, to the provider on every turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use shellq::providers::{Message, Role};
    ///
    /// let msg = Message::system("You are a terminal assistant.");
    /// assert_eq!(msg.role, Role::System);
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// How successive stream fragments relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaMode {
    /// Each fragment is new text to append
    Incremental,
    /// A fragment may repeat everything sent so far for its candidate
    Cumulative,
}

/// Secrets resolved from the environment for one model
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// API key or token
    pub api_key: String,
    /// Organization identifier, when configured and set
    pub organization: Option<String>,
    /// Project identifier, when configured and set
    pub project: Option<String>,
}

impl Credentials {
    /// Creates credentials holding only an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            organization: None,
            project: None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .finish()
    }
}

/// Provider trait for streaming chat endpoints
///
/// A provider knows how to turn a conversation into an authenticated HTTP
/// request and how to unwrap its own stream framing into plain text
/// fragments. It knows nothing about accumulation or rendering.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Display name used in error panels and logs
    fn name(&self) -> &'static str;

    /// Whether the fragments this provider emits are incremental or cumulative
    fn delta_mode(&self) -> DeltaMode;

    /// Builds the streaming request for a conversation
    ///
    /// # Arguments
    ///
    /// * `http` - Client used to build (not send) the request
    /// * `messages` - Full conversation history, oldest first
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the request cannot be constructed
    fn build_request(&self, http: &reqwest::Client, messages: &[Message])
        -> Result<reqwest::Request>;

    /// Decodes one `data:` payload into a text fragment
    ///
    /// # Returns
    ///
    /// `Ok(None)` for well-formed frames that carry no text
    ///
    /// # Errors
    ///
    /// Returns a frame decode error for malformed payloads
    fn decode_frame(&self, payload: &str) -> Result<Option<String>>;

    /// Reads a successful response and forwards each text fragment
    ///
    /// Malformed frames are logged and skipped. Reading stops at the
    /// `[DONE]` sentinel, at the end of the body, or when the receiver is
    /// dropped.
    ///
    /// # Arguments
    ///
    /// * `response` - Response whose status has already been checked
    /// * `deltas` - Channel receiving fragments in arrival order
    ///
    /// # Errors
    ///
    /// Returns a connection error when the body stream fails part way
    async fn consume_stream(
        &self,
        response: reqwest::Response,
        deltas: mpsc::UnboundedSender<String>,
    ) -> Result<()> {
        let mut decoder = SseDecoder::new();
        let body = response.bytes_stream();
        tokio::pin!(body);

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                ShellqError::Connection(format!(
                    "{} stream interrupted: {}",
                    self.name(),
                    e.without_url()
                ))
            })?;
            for frame in decoder.feed(&chunk) {
                if !forward_frame(self, frame, &deltas) {
                    return Ok(());
                }
            }
        }

        if let Some(frame) = decoder.finish() {
            forward_frame(self, frame, &deltas);
        }
        Ok(())
    }
}

/// Forwards one frame, returning false when reading should stop
fn forward_frame<P: Provider + ?Sized>(
    provider: &P,
    frame: SseFrame,
    deltas: &mpsc::UnboundedSender<String>,
) -> bool {
    match frame {
        SseFrame::Done => false,
        SseFrame::Data(payload) => match provider.decode_frame(&payload) {
            Ok(Some(text)) => deltas.send(text).is_ok(),
            Ok(None) => true,
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "Skipping stream frame");
                true
            }
        },
    }
}
