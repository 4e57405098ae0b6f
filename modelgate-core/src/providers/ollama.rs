//! Ollama provider implementation
//!
//! Adapter for the local inference daemon. It needs no credential, never
//! reports usage counters, and distinguishes "daemon not running" and "model
//! not pulled" from other failures so operators get an actionable message.
//!
//! Model-missing detection is a heuristic over the daemon's replies: HTTP 404,
//! or an error text containing "not found" (case-insensitive).

use crate::http::error::error_detail;
use crate::http::{classify_transport, malformed_response, HttpClient, TransportError};
use crate::protocol::{ChatRequest, ChatResponse, ProviderId};
use crate::providers::adapter::{AdapterConfig, ProviderAdapter};
use crate::providers::error::{CanonicalError, ProviderResult};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const PROVIDER: ProviderId = ProviderId::Ollama;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama provider implementation
pub struct OllamaAdapter {
    http: HttpClient,
}

impl OllamaAdapter {
    /// Create a new Ollama adapter on a shared client
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

fn not_configured() -> CanonicalError {
    CanonicalError::unavailable("Ollama is not configured. Set OLLAMA_HOST")
}

fn not_running(host: &str) -> CanonicalError {
    CanonicalError::unavailable(format!(
        "Ollama server not running at {host}. Start with: ollama serve"
    ))
}

fn model_not_pulled(model: &str) -> CanonicalError {
    CanonicalError::not_found(format!(
        "Ollama model '{model}' not found. Run: ollama pull {model}"
    ))
}

/// Classify a non-2xx reply from the daemon
fn classify_daemon_status(status: StatusCode, body: &str, model: &str) -> CanonicalError {
    let detail = error_detail(status, body);

    if status == StatusCode::NOT_FOUND || detail.to_lowercase().contains("not found") {
        return model_not_pulled(model);
    }

    CanonicalError::upstream(format!("Ollama error ({}): {detail}", status.as_u16()))
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn provider(&self) -> ProviderId {
        PROVIDER
    }

    async fn invoke(
        &self,
        request: &ChatRequest,
        config: &AdapterConfig,
        deadline: Duration,
    ) -> ProviderResult<ChatResponse> {
        let host = config.base_url.as_str();
        if host.is_empty() {
            return Err(not_configured());
        }

        let model = request.effective_model(&config.default_model);
        info!(model, "Calling Ollama");

        let payload = GenerateRequest {
            model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let url = format!("{host}/api/generate");
        let reply = self
            .http
            .post_json(&url, HeaderMap::new(), &payload, deadline)
            .await
            .map_err(|e| match e {
                TransportError::Connect(_) => not_running(host),
                other => classify_transport(PROVIDER, &other, deadline, None),
            })?;

        if !reply.is_success() {
            return Err(classify_daemon_status(reply.status, &reply.body, model));
        }

        let parsed: GenerateResponse = reply.json().map_err(|e| malformed_response(PROVIDER, e))?;

        // The generate endpoint does not report usage counters
        Ok(ChatResponse {
            provider: PROVIDER,
            model: model.to_string(),
            response: parsed.response.trim().to_string(),
            prompt_tokens: None,
            completion_tokens: None,
        })
    }

    async fn is_healthy(&self, config: &AdapterConfig, probe_timeout: Duration) -> bool {
        if config.base_url.is_empty() {
            return false;
        }

        let url = format!("{}/api/tags", config.base_url);
        match self.http.get(&url, probe_timeout).await {
            Ok(reply) => reply.is_success(),
            Err(e) => {
                debug!(error = %e, "Ollama health probe failed");
                false
            }
        }
    }
}
