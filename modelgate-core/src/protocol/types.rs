//! Core protocol types for the unified chat contract
//!
//! This module contains the data structures exchanged between callers and the
//! dispatcher. The inbound [`RawChatRequest`] is deliberately loose; the
//! validated [`ChatRequest`] is what adapters receive. [`ChatResponse`] is the
//! single response shape every backend is normalized into.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default number of tokens to generate when the caller does not say
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Default sampling temperature when the caller does not say
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Upper bound on prompt length, in characters
pub const MAX_PROMPT_CHARS: usize = 10_000;

/// Inclusive bounds for `max_tokens`
pub const MAX_TOKENS_RANGE: (u32, u32) = (1, 4096);

/// Inclusive bounds for `temperature`
pub const TEMPERATURE_RANGE: (f32, f32) = (0.0, 2.0);

/// Identifier of a supported inference backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// OpenAI chat completions API
    OpenAI,
    /// Anthropic messages API
    Anthropic,
    /// Google Gemini generateContent API
    Gemini,
    /// Local Ollama daemon
    Ollama,
}

impl ProviderId {
    /// Every provider the gateway knows about, in display order
    pub const ALL: [ProviderId; 4] = [
        ProviderId::OpenAI,
        ProviderId::Anthropic,
        ProviderId::Gemini,
        ProviderId::Ollama,
    ];

    /// Wire identifier used in requests and health reports
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAI => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Gemini => "gemini",
            ProviderId::Ollama => "ollama",
        }
    }

    /// Human-facing name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::OpenAI => "OpenAI",
            ProviderId::Anthropic => "Anthropic",
            ProviderId::Gemini => "Gemini",
            ProviderId::Ollama => "Ollama",
        }
    }

    /// Whether the provider runs on-host rather than behind a cloud API
    pub fn is_local(&self) -> bool {
        matches!(self, ProviderId::Ollama)
    }

    /// Comma separated list of the given providers, e.g. for error messages
    pub fn list(ids: impl IntoIterator<Item = ProviderId>) -> String {
        ids.into_iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported provider: '{0}'")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// Inbound chat request before validation
///
/// Every field is optional so that a missing field surfaces as a validation
/// error naming that field rather than an opaque deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawChatRequest {
    #[serde(default)]
    pub provider: Option<String>,

    #[serde(default)]
    pub prompt: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub max_tokens: Option<i64>,

    #[serde(default)]
    pub temperature: Option<f64>,
}

impl RawChatRequest {
    /// Create a raw request for a provider and prompt
    pub fn new(provider: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Validated, normalized chat request
///
/// Produced by [`crate::protocol::validate`]; adapters assume every field is
/// already within range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub provider: ProviderId,
    pub prompt: String,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatRequest {
    /// The model to call: the requested one, or the provider default
    pub fn effective_model<'a>(&'a self, default_model: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default_model)
    }
}

/// Normalized chat response, identical in shape for every provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Provider that served the request
    pub provider: ProviderId,

    /// Model actually used
    pub model: String,

    /// Generated text
    pub response: String,

    /// Prompt token count, `null` when the backend does not report usage
    pub prompt_tokens: Option<u32>,

    /// Completion token count, `null` when the backend does not report usage
    pub completion_tokens: Option<u32>,
}
