//! Google Gemini provider implementation
//!
//! Speaks `POST {base}/models/{model}:generateContent`. The key travels in the
//! `x-goog-api-key` header rather than the `key` query parameter so it can
//! never surface in a URL echoed by the HTTP stack.

use crate::http::{malformed_response, secret_header, HttpClient};
use crate::protocol::{ChatRequest, ChatResponse, ProviderId};
use crate::providers::adapter::{AdapterConfig, ProviderAdapter};
use crate::providers::error::{CanonicalError, ProviderResult};
use crate::providers::send_cloud_request;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PROVIDER: ProviderId = ProviderId::Gemini;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: [GeminiContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: [GeminiPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

/// Google Gemini provider implementation
pub struct GeminiAdapter {
    http: HttpClient,
}

impl GeminiAdapter {
    /// Create a new Gemini adapter on a shared client
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

/// Model path segment; accepts both `gemini-1.5-flash` and `models/gemini-1.5-flash`
fn model_path(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
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
        headers.insert(
            HeaderName::from_static("x-goog-api-key"),
            secret_header("", api_key)?,
        );

        let payload = GeminiRequest {
            contents: [GeminiContent {
                parts: [GeminiPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            config.base_url,
            model_path(model)
        );
        debug!(model, "Calling Gemini");

        let reply =
            send_cloud_request(&self.http, PROVIDER, &url, headers, &payload, deadline, api_key)
                .await?;

        let parsed: GeminiResponse = reply.json().map_err(|e| malformed_response(PROVIDER, e))?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return Err(CanonicalError::upstream(format!(
                "Gemini blocked the prompt for model '{model}': {reason}"
            )));
        }

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
            .ok_or_else(|| malformed_response(PROVIDER, "response contained no candidates"))?;

        let usage = parsed.usage_metadata;
        Ok(ChatResponse {
            provider: PROVIDER,
            model: model.to_string(),
            response: text.trim().to_string(),
            prompt_tokens: usage.as_ref().and_then(|u| u.prompt_token_count),
            completion_tokens: usage.as_ref().and_then(|u| u.candidates_token_count),
        })
    }
}
