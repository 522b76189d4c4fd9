//! Completion API client
//!
//! Direct HTTP client for the chat-completions endpoint. One request per
//! exchange, no retries: any non-success status is surfaced verbatim.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::completion::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::CompletionConfig;
use crate::exchange::ExchangeError;

/// Client for a chat-completions endpoint
///
/// Holds a pooled `reqwest::Client`; cheap to share behind an `Arc`.
pub struct CompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    model: String,
}

impl CompletionClient {
    /// Build a client from configuration
    ///
    /// # Errors
    /// * Returns the `reqwest` error if the TLS backend cannot be initialized
    pub fn new(config: &CompletionConfig) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            endpoint: format!("{}/chat/completions", config.base_url),
            api_key: SecretString::new(config.api_key.expose_secret().clone()),
            model: config.model.clone(),
        })
    }

    /// Model identifier sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` as a single user message and return the reply text
    ///
    /// # Errors
    /// * `ExchangeError::UpstreamUnreachable` on transport failure
    /// * `ExchangeError::Upstream` on any non-success status (status and body kept)
    /// * `ExchangeError::MalformedUpstreamResponse` if `choices[0].message.content`
    ///   is missing or the body is not JSON
    pub async fn complete(&self, prompt: &str) -> Result<String, ExchangeError> {
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(
            url = %self.endpoint,
            model = %self.model,
            prompt_len = prompt.len(),
            "Calling completion API"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                status_code = status.as_u16(),
                error_body = %body,
                "Completion API returned error status"
            );

            return Err(ExchangeError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let response_body = response.text().await?;
        let parsed: ChatCompletionResponse =
            serde_json::from_str(&response_body).map_err(|e| {
                ExchangeError::MalformedUpstreamResponse(format!(
                    "invalid JSON ({}): {}",
                    e, response_body
                ))
            })?;

        let text = parsed.first_content().ok_or_else(|| {
            ExchangeError::MalformedUpstreamResponse(
                "missing choices[0].message.content".to_string(),
            )
        })?;

        tracing::debug!(
            response_len = text.len(),
            finish_reason = parsed.first_finish_reason().unwrap_or("unknown"),
            "Received completion"
        );

        Ok(text.to_string())
    }
}
