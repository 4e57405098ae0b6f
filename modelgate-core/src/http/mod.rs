//! HTTP transport shared by all provider adapters
//!
//! This module implements the outbound HTTP layer, handling:
//! - One pooled client shared by every adapter and every request
//! - Per-call deadlines
//! - Mapping of transport failures and non-2xx statuses to canonical errors

pub mod client;
pub mod error;

pub use client::{HttpClient, TransportError, UpstreamReply};
pub use error::{classify_status, classify_transport, extract_error_message, malformed_response};

use crate::config::SecretString;
use crate::providers::error::{CanonicalError, ProviderResult};
use reqwest::header::HeaderValue;

/// Build a header value from a credential, marked sensitive so it is never
/// printed by the HTTP stack's own debug output
pub fn secret_header(prefix: &str, secret: &SecretString) -> ProviderResult<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("{prefix}{}", secret.expose_secret()))
        .map_err(|_| CanonicalError::auth("configured API key contains invalid characters"))?;
    value.set_sensitive(true);
    Ok(value)
}
