//! Anthropic provider implementation
//!
//! Speaks the messages API: `POST {base}/messages`, authenticated with the
//! `x-api-key` header and pinned to a fixed `anthropic-version`.

use crate::http::{malformed_response, secret_header, HttpClient};
use crate::protocol::{ChatRequest, ChatResponse, ProviderId};
use crate::providers::adapter::{AdapterConfig, ProviderAdapter};
use crate::providers::error::ProviderResult;
use crate::providers::send_cloud_request;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PROVIDER: ProviderId = ProviderId::Anthropic;

/// API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    messages: [AnthropicMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

/// Anthropic provider implementation
pub struct AnthropicAdapter {
    http: HttpClient,
}

impl AnthropicAdapter {
    /// Create a new Anthropic adapter on a shared client
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> ProviderId {
        PROVIDER
    }

    async fn invoke(
        &self,
        request: &ChatRequest,
        config: &AdapterConfig,
        deadline: Duration,
    ) -> ProviderResult<ChatResponse> {
        let api_key = config.require_api_key(PROVIDER)?;
        let model = request.effective_model(&config.default_model);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-api-key"), secret_header("", api_key)?);
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let payload = AnthropicRequest {
            model,
            messages: [AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let url = format!("{}/messages", config.base_url);
        debug!(model, "Calling Anthropic");

        let reply =
            send_cloud_request(&self.http, PROVIDER, &url, headers, &payload, deadline, api_key)
                .await?;

        let parsed: AnthropicResponse =
            reply.json().map_err(|e| malformed_response(PROVIDER, e))?;

        // Responses may interleave non-text blocks; the first text block is the answer
        let text = parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| malformed_response(PROVIDER, "response contained no text block"))?;

        let usage = parsed.usage;
        Ok(ChatResponse {
            provider: PROVIDER,
            model: model.to_string(),
            response: text.trim().to_string(),
            prompt_tokens: usage.as_ref().and_then(|u| u.input_tokens),
            completion_tokens: usage.as_ref().and_then(|u| u.output_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text_block_wins() {
        let parsed: AnthropicResponse = serde_json::from_str(
            r#"{
                "content": [
                    {"type": "thinking", "thinking": "..."},
                    {"type": "text", "text": "answer"}
                ],
                "usage": {"input_tokens": 3, "output_tokens": 1}
            }"#,
        )
        .unwrap();
        let text = parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text);
        assert_eq!(text.as_deref(), Some("answer"));
    }
}
