//! HTTP error mapping utilities

use super::client::TransportError;
use crate::config::{redact_credentials, SecretString};
use crate::protocol::ProviderId;
use crate::providers::error::CanonicalError;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Longest stretch of raw upstream body echoed back in a message
const MAX_DETAIL_CHARS: usize = 512;

/// Reason code Google APIs attach to a rejected key
const GOOGLE_INVALID_KEY_REASON: &str = "API_KEY_INVALID";
/// Message text Gemini sends with the same rejection
const GOOGLE_INVALID_KEY_TEXT: &str = "api key not valid";

/// Map a non-2xx status and its body to a canonical error
pub fn classify_status(
    provider: ProviderId,
    status: StatusCode,
    body: &str,
    secret: Option<&SecretString>,
) -> CanonicalError {
    let detail = redact_credentials(&error_detail(status, body), secret);
    let name = provider.display_name();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CanonicalError::auth(format!("{name} API Error: {detail}"))
        }
        // Gemini answers a bad key with 400 INVALID_ARGUMENT instead of 401
        StatusCode::BAD_REQUEST if provider == ProviderId::Gemini && rejects_api_key(body) => {
            CanonicalError::auth(format!("{name} API Error: {detail}"))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => CanonicalError::upstream(
            format!("{name} API Error ({}): upstream timeout: {detail}", status.as_u16()),
        ),
        _ => CanonicalError::upstream(format!(
            "{name} API Error ({}): {detail}",
            status.as_u16()
        )),
    }
}

/// Map a transport failure to a canonical error
pub fn classify_transport(
    provider: ProviderId,
    err: &TransportError,
    deadline: Duration,
    secret: Option<&SecretString>,
) -> CanonicalError {
    let name = provider.display_name();

    match err {
        TransportError::Timeout => CanonicalError::timeout(provider, deadline),
        TransportError::Connect(message) => CanonicalError::unavailable(format!(
            "{name} is unreachable: {}",
            redact_credentials(message, secret)
        )),
        other => CanonicalError::upstream(format!(
            "{name} request failed: {}",
            redact_credentials(&other.to_string(), secret)
        )),
    }
}

/// A 2xx reply whose body does not have the expected shape
pub fn malformed_response(provider: ProviderId, cause: impl std::fmt::Display) -> CanonicalError {
    CanonicalError::upstream(format!(
        "{} returned a malformed response: {}",
        provider.display_name(),
        cause
    ))
}

/// Extract a human-readable message from a JSON error body
///
/// Tries, in order: `error.message`, `error` as a string, top-level `message`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;

    // OpenAI / Anthropic / Gemini format: { "error": { "message": "..." } }
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }

    // Ollama format: { "error": "..." }
    if let Some(error) = json.get("error").and_then(Value::as_str) {
        return Some(error.to_string());
    }

    json.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Whether a Google-style error body reports an invalid API key
fn rejects_api_key(body: &str) -> bool {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.to_lowercase().contains(GOOGLE_INVALID_KEY_TEXT);
    };
    let error = json.get("error");

    let reason_matches = error
        .and_then(|e| e.get("details"))
        .and_then(Value::as_array)
        .is_some_and(|details| {
            details.iter().any(|detail| {
                detail.get("reason").and_then(Value::as_str) == Some(GOOGLE_INVALID_KEY_REASON)
            })
        });

    reason_matches
        || error
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .is_some_and(|message| message.to_lowercase().contains(GOOGLE_INVALID_KEY_TEXT))
}

/// Message for an error body: the JSON error text, else the raw body
/// truncated, else the status reason phrase
pub(crate) fn error_detail(status: StatusCode, body: &str) -> String {
    if let Some(message) = extract_error_message(body) {
        return message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string();
    }

    truncate(trimmed, MAX_DETAIL_CHARS)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::error::Severity;

    #[test]
    fn test_extract_nested_message() {
        let body = r#"{"error":{"message":"Invalid model","type":"invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("Invalid model"));
    }

    #[test]
    fn test_extract_flat_error() {
        let body = r#"{"error":"model \"mistral:7b\" not found, try pulling it first"}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("model \"mistral:7b\" not found, try pulling it first")
        );
    }

    #[test]
    fn test_extract_top_level_message() {
        assert_eq!(
            extract_error_message(r#"{"message":"bad"}"#).as_deref(),
            Some("bad")
        );
        assert_eq!(extract_error_message("<html>oops</html>"), None);
    }

    #[test]
    fn test_auth_statuses() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = classify_status(ProviderId::OpenAI, status, "{}", None);
            assert_eq!(err.severity, Severity::AuthError);
            assert!(err.message.starts_with("OpenAI API Error"));
        }
    }

    #[test]
    fn test_server_error_is_upstream() {
        let err = classify_status(
            ProviderId::Anthropic,
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"error":{"type":"overloaded_error","message":"Overloaded"}}"#,
            None,
        );
        assert_eq!(err.severity, Severity::UpstreamError);
        assert_eq!(err.message, "Anthropic API Error (503): Overloaded");
    }

    #[test]
    fn test_other_client_status_embeds_message_without_key() {
        let secret = SecretString::new("my-precious-key");
        let err = classify_status(
            ProviderId::OpenAI,
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"max_tokens is too large for key my-precious-key"}}"#,
            Some(&secret),
        );
        assert_eq!(err.severity, Severity::UpstreamError);
        assert!(err.message.starts_with("OpenAI API Error (400)"));
        assert!(err.message.contains("[REDACTED]"));
        assert!(!err.message.contains("my-precious-key"));
    }

    #[test]
    fn test_gemini_invalid_key_is_auth_error() {
        let secret = SecretString::new("AIzaStaleKey123");
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID"}]}}"#;

        let err = classify_status(ProviderId::Gemini, StatusCode::BAD_REQUEST, body, Some(&secret));
        assert_eq!(err.severity, Severity::AuthError);
        assert_eq!(
            err.message,
            "Gemini API Error: API key not valid. Please pass a valid API key."
        );
    }

    #[test]
    fn test_gemini_reason_code_alone_is_auth_error() {
        let body = r#"{"error":{"message":"Request rejected","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        let err = classify_status(ProviderId::Gemini, StatusCode::BAD_REQUEST, body, None);
        assert_eq!(err.severity, Severity::AuthError);
    }

    #[test]
    fn test_gemini_other_bad_request_is_upstream() {
        let body = r#"{"error":{"message":"Invalid JSON payload received.","status":"INVALID_ARGUMENT"}}"#;
        let err = classify_status(ProviderId::Gemini, StatusCode::BAD_REQUEST, body, None);
        assert_eq!(err.severity, Severity::UpstreamError);
    }

    #[test]
    fn test_empty_body_uses_reason_phrase() {
        let err = classify_status(ProviderId::OpenAI, StatusCode::BAD_GATEWAY, "", None);
        assert_eq!(err.message, "OpenAI API Error (502): Bad Gateway");
    }

    #[test]
    fn test_long_body_truncated() {
        let body = "x".repeat(2_000);
        let err = classify_status(ProviderId::OpenAI, StatusCode::IM_A_TEAPOT, &body, None);
        assert!(err.message.len() < 600);
        assert!(err.message.ends_with("..."));
    }

    #[test]
    fn test_transport_classification() {
        let deadline = Duration::from_secs(30);

        let err = classify_transport(ProviderId::OpenAI, &TransportError::Timeout, deadline, None);
        assert_eq!(err.severity, Severity::UpstreamError);
        assert!(err.message.contains("timed out"));

        let err = classify_transport(
            ProviderId::Gemini,
            &TransportError::Connect("dns error".to_string()),
            deadline,
            None,
        );
        assert_eq!(err.severity, Severity::Unavailable);

        let err = classify_transport(
            ProviderId::Anthropic,
            &TransportError::TooLarge { size: 11, limit: 10 },
            deadline,
            None,
        );
        assert_eq!(err.severity, Severity::UpstreamError);
    }
}
