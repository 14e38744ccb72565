//! HTTP client driving one streaming query at a time

use crate::error::{Result, ShellqError};
use crate::providers::{Message, Provider};
use crate::session::accumulator::StreamAccumulator;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Longest slice of an error response body kept in the error message
const MAX_ERROR_BODY: usize = 300;

/// Sends conversations to a provider and accumulates the streamed reply
///
/// Cloning is cheap; clones share the connection pool and provider.
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    provider: Arc<dyn Provider>,
}

impl LlmClient {
    /// Creates a client with an overall per-request timeout
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built
    pub fn new(provider: Arc<dyn Provider>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shellq/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ShellqError::Config(format!("Failed to create HTTP client: {}", e.without_url()))
            })?;
        Ok(Self { http, provider })
    }

    /// Display name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Streams a reply for `messages`
    ///
    /// `on_update` receives the full accumulated text after every accepted
    /// fragment, in arrival order.
    ///
    /// # Returns
    ///
    /// The complete reply text once the stream ends
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the request cannot be built, and a
    /// connection error for transport failures, timeouts and non-success
    /// statuses. Partial text is discarded on error.
    pub async fn stream_reply<F>(&self, messages: &[Message], mut on_update: F) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        let request = self.provider.build_request(&self.http, messages)?;
        tracing::debug!(
            provider = self.provider.name(),
            host = request.url().host_str().unwrap_or_default(),
            messages = messages.len(),
            "Sending streaming request"
        );

        let response = self.http.execute(request).await.map_err(|e| {
            ShellqError::Connection(format!(
                "Failed to make the API request to {}: {}",
                self.provider.name(),
                e.without_url()
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                provider = self.provider.name(),
                status = %status,
                "API request failed"
            );
            return Err(ShellqError::Connection(failure_message(status, &body)).into());
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let mut accumulator = StreamAccumulator::new(self.provider.delta_mode());

        let consume = self.provider.consume_stream(response, tx);
        let drain = async {
            while let Some(fragment) = rx.recv().await {
                if let Some(text) = accumulator.push(&fragment) {
                    on_update(text);
                }
            }
        };
        let (result, ()) = tokio::join!(consume, drain);
        result?;

        tracing::debug!(
            provider = self.provider.name(),
            fragments = accumulator.accepted(),
            "Stream finished"
        );
        Ok(accumulator.into_text())
    }
}

fn failure_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("API request failed: {}", status);
    }
    let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
    format!("API request failed: {}\n{}", status, snippet)
}
