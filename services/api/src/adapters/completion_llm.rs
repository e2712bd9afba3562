//! services/api/src/adapters/completion_llm.rs
//!
//! This module contains the adapter for the hosted chat-completion gateway.
//! It implements the `CompletionService` port from the `core` crate by
//! speaking the OpenAI chat-completions wire dialect over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use solace_core::domain::Turn;
use solace_core::ports::{CompletionService, GatewayError};
use tracing::warn;

/// Token budget for one reply. Keeps replies concise and bounds cost.
const MAX_TOKENS: u32 = 1024;
/// Sampling temperature for warm but stable replies.
const TEMPERATURE: f32 = 0.7;

/// The reply used when the gateway answers 2xx but the first choice carries
/// no usable text. A degraded reply beats a hard failure on this path.
pub const EMPTY_COMPLETION_FALLBACK: &str =
    "I'm here for you. Could you tell me more about what's on your mind?";

//=========================================================================================
// Wire Types (OpenAI chat-completions dialect)
//=========================================================================================

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionService` against any hosted
/// chat-completions endpoint.
#[derive(Clone)]
pub struct CompletionGatewayAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl CompletionGatewayAdapter {
    /// Creates a new `CompletionGatewayAdapter`. The timeout covers the whole
    /// round trip; a request that exceeds it surfaces as `Upstream`.
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
        })
    }
}

//=========================================================================================
// `CompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionService for CompletionGatewayAdapter {
    /// Issues one non-streaming completion request, the system prompt
    /// prepended to the caller's turns, and maps the upstream's failure
    /// statuses onto the gateway error taxonomy.
    async fn complete(
        &self,
        system_prompt: &str,
        turns: &[Turn],
    ) -> Result<String, GatewayError> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: system_prompt,
        });
        for turn in turns {
            messages.push(WireMessage {
                role: turn.role.as_str(),
                content: &turn.content,
            });
        }

        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => GatewayError::Throttled,
                StatusCode::PAYMENT_REQUIRED => GatewayError::Unavailable,
                _ => {
                    // The body goes into the error payload for the caller to
                    // log; it is never surfaced to the user.
                    let body = response.text().await.unwrap_or_default();
                    GatewayError::Upstream(format!("status {}: {}", status, body))
                }
            });
        }

        let decoded: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Upstream(format!("undecodable completion body: {}", e)))?;

        let content = decoded
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.is_empty());

        match content {
            Some(text) => Ok(text),
            None => {
                warn!("completion gateway returned no usable choice text");
                Ok(EMPTY_COMPLETION_FALLBACK.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_the_base_url_cleanly() {
        let adapter = CompletionGatewayAdapter::new(
            "https://api.example.com/v1/",
            "key".to_string(),
            "model".to_string(),
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(adapter.endpoint, "https://api.example.com/v1/chat/completions");

        let adapter = CompletionGatewayAdapter::new(
            "https://api.example.com/v1",
            "key".to_string(),
            "model".to_string(),
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(adapter.endpoint, "https://api.example.com/v1/chat/completions");
    }
}
