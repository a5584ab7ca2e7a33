//! Anthropic Claude provider implementation
//!
//! This module implements the LLMProvider trait for Anthropic's Claude models.
//! See: https://docs.anthropic.com/en/api/messages

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(
                "Anthropic API key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self { client, api_key })
    }

    /// Create a provider from environment variable
    ///
    /// Reads the API key from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            LLMError::ConfigurationError(
                "ANTHROPIC_API_KEY environment variable not set".to_string(),
            )
        })?;
        Self::new(api_key)
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Anthropic API");

        let model = request.model.clone();
        let anthropic_request = build_anthropic_request(request);

        let response = self
            .client
            .post(format!("{ANTHROPIC_API_BASE}/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&anthropic_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(LLMError::from_status(status, error_text, &model));
        }

        let anthropic_response: AnthropicResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        debug!(
            stop_reason = %anthropic_response.stop_reason,
            input_tokens = anthropic_response.usage.input_tokens,
            output_tokens = anthropic_response.usage.output_tokens,
            "Received response"
        );

        Ok(CompletionResponse {
            message: Message::assistant(anthropic_response.joined_text()),
            stop_reason: StopReason::from_provider(&anthropic_response.stop_reason),
            usage: TokenUsage {
                input_tokens: anthropic_response.usage.input_tokens,
                output_tokens: anthropic_response.usage.output_tokens,
            },
        })
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

// Anthropic-specific request/response types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    stop_reason: String,
    usage: UsageResponse,
}

impl AnthropicResponse {
    fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    input_tokens: usize,
    output_tokens: usize,
}

/// The messages API takes the system prompt as a top-level field, so any
/// system-role messages are folded into it.
fn build_anthropic_request(request: CompletionRequest) -> AnthropicRequest {
    let mut system_parts: Vec<String> = request.system.into_iter().collect();
    let mut messages = Vec::with_capacity(request.messages.len());

    for msg in request.messages {
        match msg.role {
            Role::System => system_parts.push(msg.content),
            role => messages.push(AnthropicMessage {
                role: role.as_str(),
                content: msg.content,
            }),
        }
    }

    AnthropicRequest {
        model: request.model,
        messages,
        system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        stop_sequences: request.stop_sequences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = AnthropicProvider::new("test-key");
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().name(), "anthropic");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(AnthropicProvider::new("").is_err());
    }

    #[test]
    fn test_system_messages_folded() {
        let request = CompletionRequest::builder("claude-sonnet-4-5")
            .system("You are a fundamental analyst")
            .add_message(Message::system("Be concise"))
            .add_message(Message::user("Analyze MSFT"))
            .build();

        let built = build_anthropic_request(request);
        assert_eq!(built.messages.len(), 1);
        assert_eq!(built.messages[0].role, "user");
        assert_eq!(
            built.system.as_deref(),
            Some("You are a fundamental analyst\n\nBe concise")
        );
    }

    #[test]
    fn test_response_text_joined() {
        let body = r#"{
            "content": [
                {"type": "text", "text": "Revenue grew."},
                {"type": "text", "text": "RECOMMENDATION: SELL"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 6}
        }"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.joined_text(), "Revenue grew.\nRECOMMENDATION: SELL");
    }
}
