//! Request validation
//!
//! The single place where malformed input is rejected. Validation is pure:
//! it never touches the network or the registry.

use super::types::{
    ChatRequest, ProviderId, RawChatRequest, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
    MAX_PROMPT_CHARS, MAX_TOKENS_RANGE, TEMPERATURE_RANGE,
};
use crate::error::ValidationError;
use serde_json::Value;

/// Validate a raw request and apply defaults
pub fn validate(raw: RawChatRequest) -> Result<ChatRequest, ValidationError> {
    let provider = validate_provider(raw.provider.as_deref())?;
    let prompt = validate_prompt(raw.prompt)?;
    let max_tokens = validate_max_tokens(raw.max_tokens)?;
    let temperature = validate_temperature(raw.temperature)?;

    // An empty model string means "use the provider default"
    let model = raw.model.filter(|m| !m.trim().is_empty());

    Ok(ChatRequest {
        provider,
        prompt,
        model,
        max_tokens,
        temperature,
    })
}

/// Validate a request body that has not been deserialized yet
pub fn validate_json(body: Value) -> Result<ChatRequest, ValidationError> {
    if !body.is_object() {
        return Err(ValidationError::invalid_format(
            "body",
            "request body must be a JSON object",
        ));
    }

    let raw: RawChatRequest = serde_json::from_value(body)
        .map_err(|e| ValidationError::invalid_format("body", e.to_string()))?;

    validate(raw)
}

fn supported_providers() -> String {
    ProviderId::list(ProviderId::ALL)
}

fn validate_provider(provider: Option<&str>) -> Result<ProviderId, ValidationError> {
    let provider = provider.ok_or_else(|| {
        ValidationError::required("provider")
            .with_context(format!("supported providers: {}", supported_providers()))
    })?;

    provider.parse::<ProviderId>().map_err(|_| {
        ValidationError::invalid_value(
            "provider",
            format!("one of {}", supported_providers()),
            provider,
        )
    })
}

fn validate_prompt(prompt: Option<String>) -> Result<String, ValidationError> {
    let prompt = prompt.ok_or_else(|| ValidationError::required("prompt"))?;

    let chars = prompt.chars().count();
    if chars == 0 || chars > MAX_PROMPT_CHARS {
        return Err(ValidationError::out_of_range(
            "prompt",
            format!("length must be between 1 and {MAX_PROMPT_CHARS} characters, got {chars}"),
        ));
    }

    Ok(prompt)
}

fn validate_max_tokens(max_tokens: Option<i64>) -> Result<u32, ValidationError> {
    let Some(value) = max_tokens else {
        return Ok(DEFAULT_MAX_TOKENS);
    };

    let (min, max) = MAX_TOKENS_RANGE;
    if value < i64::from(min) || value > i64::from(max) {
        return Err(ValidationError::out_of_range(
            "max_tokens",
            format!("must be between {min} and {max}, got {value}"),
        ));
    }

    Ok(value as u32)
}

fn validate_temperature(temperature: Option<f64>) -> Result<f32, ValidationError> {
    let Some(value) = temperature else {
        return Ok(DEFAULT_TEMPERATURE);
    };

    let (min, max) = TEMPERATURE_RANGE;
    if !value.is_finite() || value < f64::from(min) || value > f64::from(max) {
        return Err(ValidationError::out_of_range(
            "temperature",
            format!("must be between {min:.1} and {max:.1}, got {value}"),
        ));
    }

    Ok(value as f32)
}
