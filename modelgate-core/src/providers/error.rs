//! Canonical error taxonomy surfaced to gateway callers

use crate::error::ValidationError;
use crate::protocol::ProviderId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, CanonicalError>;

/// Severity class of a canonical error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Malformed or unsupported request; the caller's fault, never retried
    ClientError,
    /// Credential missing or rejected by the backend
    AuthError,
    /// Requested resource (typically a local model) does not exist
    NotFound,
    /// Backend process or service unreachable
    Unavailable,
    /// Backend accepted the request shape but failed or timed out
    UpstreamError,
}

impl Severity {
    /// HTTP status code the server surface answers with
    pub fn http_status(&self) -> u16 {
        match self {
            Severity::ClientError => 400,
            Severity::AuthError => 401,
            Severity::NotFound => 400,
            Severity::Unavailable => 503,
            Severity::UpstreamError => 502,
        }
    }

    /// Wire name of the severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::ClientError => "client_error",
            Severity::AuthError => "auth_error",
            Severity::NotFound => "not_found",
            Severity::Unavailable => "unavailable",
            Severity::UpstreamError => "upstream_error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-agnostic error returned for every failed dispatch
///
/// Messages carry provider name, model and a human-readable cause. They never
/// contain credentials; adapters redact before constructing one.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct CanonicalError {
    pub severity: Severity,
    pub message: String,
}

impl CanonicalError {
    /// Create a new canonical error
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn client(message: impl Into<String>) -> Self {
        Self::new(Severity::ClientError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(Severity::AuthError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Severity::NotFound, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Severity::Unavailable, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(Severity::UpstreamError, message)
    }

    /// Upstream timeout naming the provider and the deadline that elapsed
    pub fn timeout(provider: ProviderId, deadline: Duration) -> Self {
        Self::upstream(format!(
            "{} request timed out after {}",
            provider.display_name(),
            format_duration(deadline)
        ))
    }

    /// Registry lookup miss
    pub fn unsupported_provider(
        requested: impl fmt::Display,
        available: impl IntoIterator<Item = ProviderId>,
    ) -> Self {
        Self::client(format!(
            "Unsupported provider: '{}'. Available: {}",
            requested,
            ProviderId::list(available)
        ))
    }

    /// HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        self.severity.http_status()
    }
}

impl From<ValidationError> for CanonicalError {
    fn from(err: ValidationError) -> Self {
        CanonicalError::client(err.to_string())
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
