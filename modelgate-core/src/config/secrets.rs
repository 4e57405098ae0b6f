//! Secrets handling and credential redaction
//!
//! This module provides:
//! - [`SecretString`], a wrapper whose `Display`/`Debug` never reveal the value
//! - [`redact_credentials`], applied to every message that may echo upstream text

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Placeholder substituted for anything that looks like a credential
pub const REDACTED: &str = "[REDACTED]";

/// A wrapper type for sensitive strings like API keys
#[derive(Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Get the actual value (use with caution)
    pub fn expose_secret(&self) -> &str {
        &self.value
    }

    /// Check if the secret is empty or whitespace only
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{REDACTED}")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{REDACTED}")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

static CREDENTIAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Authorization header values
        r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]+",
        // Query-string keys such as ?key=... or &api_key=...
        r"(?i)\b(api[_-]?key|key|token)=[^&\s]+",
        // Provider key formats (sk-..., sk-ant-..., AIza...)
        r"\bsk-[A-Za-z0-9_-]{8,}",
        r"\bAIza[0-9A-Za-z_-]{20,}",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("credential pattern is a valid regex"))
    .collect()
});

/// Remove credential material from text that may be shown to callers or logged
///
/// Every configured secret is replaced verbatim first, then common credential
/// shapes are masked.
pub fn redact_credentials<'a>(
    text: &str,
    secrets: impl IntoIterator<Item = &'a SecretString>,
) -> String {
    let mut result = text.to_string();

    for secret in secrets {
        if !secret.is_empty() {
            result = result.replace(secret.expose_secret(), REDACTED);
        }
    }

    for pattern in CREDENTIAL_PATTERNS.iter() {
        result = pattern.replace_all(&result, REDACTED).into_owned();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_redaction() {
        let secret = SecretString::new("sk-1234567890abcdef");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
    }

    #[test]
    fn test_secret_string_expose() {
        let secret = SecretString::new("my-secret-value");
        assert_eq!(secret.expose_secret(), "my-secret-value");
    }

    #[test]
    fn test_whitespace_secret_is_empty() {
        assert!(SecretString::new("   ").is_empty());
        assert!(!SecretString::new("x").is_empty());
    }

    #[test]
    fn test_redact_configured_secret() {
        let secret = SecretString::new("plain-secret-without-prefix");
        let text = "Incorrect API key provided: plain-secret-without-prefix.";
        assert_eq!(
            redact_credentials(text, [&secret]),
            "Incorrect API key provided: [REDACTED]."
        );
    }

    #[test]
    fn test_redact_known_shapes() {
        let none: [&SecretString; 0] = [];
        let redacted = redact_credentials(
            "url https://host/v1?key=AIzaSyD-abcdefghijklmnopqrstuv&alt=json Bearer abc.def sk-ant-api03-xyzxyzxyz",
            none,
        );
        assert!(!redacted.contains("AIzaSy"));
        assert!(!redacted.contains("abc.def"));
        assert!(!redacted.contains("sk-ant"));
        assert!(redacted.contains("alt=json"));
    }

    #[test]
    fn test_redact_leaves_plain_text() {
        let none: [&SecretString; 0] = [];
        assert_eq!(
            redact_credentials("model 'gpt-9' does not exist", none),
            "model 'gpt-9' does not exist"
        );
    }
}
