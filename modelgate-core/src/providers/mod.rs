//! Provider adapters and the registry that maps identifiers to them
//!
//! Each backend gets one adapter implementing [`ProviderAdapter`]. Adding a
//! backend means adding one adapter and one registry entry; nothing else in
//! the dispatch path changes.

pub mod adapter;
pub mod anthropic;
pub mod error;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod registry;

pub use adapter::{AdapterConfig, ProviderAdapter};
pub use error::{CanonicalError, ProviderResult, Severity};
pub use registry::{ProviderEntry, ProviderRegistry, ProviderRegistryBuilder};

// Re-export concrete providers
pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAIAdapter;

use crate::config::SecretString;
use crate::http::{classify_status, classify_transport, HttpClient, UpstreamReply};
use crate::protocol::ProviderId;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::time::Duration;

/// Send a cloud API request and return only successful replies
///
/// Transport failures and non-2xx statuses are classified here with the
/// shared cloud rules; the credential is redacted from every message.
pub(crate) async fn send_cloud_request<B>(
    http: &HttpClient,
    provider: ProviderId,
    url: &str,
    headers: HeaderMap,
    payload: &B,
    deadline: Duration,
    api_key: &SecretString,
) -> ProviderResult<UpstreamReply>
where
    B: Serialize + ?Sized,
{
    let reply = http
        .post_json(url, headers, payload, deadline)
        .await
        .map_err(|e| classify_transport(provider, &e, deadline, Some(api_key)))?;

    if !reply.is_success() {
        return Err(classify_status(provider, reply.status, &reply.body, Some(api_key)));
    }

    Ok(reply)
}
