//! OpenAI provider implementation
//!
//! Speaks the chat completions API: `POST {base}/chat/completions` with a
//! bearer token.

use crate::http::{malformed_response, secret_header, HttpClient};
use crate::protocol::{ChatRequest, ChatResponse, ProviderId};
use crate::providers::adapter::{AdapterConfig, ProviderAdapter};
use crate::providers::error::ProviderResult;
use crate::providers::send_cloud_request;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PROVIDER: ProviderId = ProviderId::OpenAI;

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: [OpenAIMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

/// OpenAI provider implementation
pub struct OpenAIAdapter {
    http: HttpClient,
}

impl OpenAIAdapter {
    /// Create a new OpenAI adapter on a shared client
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAIAdapter {
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
        headers.insert(AUTHORIZATION, secret_header("Bearer ", api_key)?);

        let payload = OpenAIRequest {
            model,
            messages: [OpenAIMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let url = format!("{}/chat/completions", config.base_url);
        debug!(model, "Calling OpenAI");

        let reply =
            send_cloud_request(&self.http, PROVIDER, &url, headers, &payload, deadline, api_key)
                .await?;

        let parsed: OpenAIResponse = reply.json().map_err(|e| malformed_response(PROVIDER, e))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| malformed_response(PROVIDER, "response contained no choices"))?;

        let usage = parsed.usage;
        Ok(ChatResponse {
            provider: PROVIDER,
            model: model.to_string(),
            response: text.trim().to_string(),
            prompt_tokens: usage.as_ref().and_then(|u| u.prompt_tokens),
            completion_tokens: usage.as_ref().and_then(|u| u.completion_tokens),
        })
    }
}
