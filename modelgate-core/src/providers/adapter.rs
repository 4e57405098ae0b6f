//! Provider adapter trait and static adapter configuration
//!
//! An adapter is the only place that knows a backend's wire format. It turns
//! a validated [`ChatRequest`] into one HTTP call and maps whatever comes back
//! into a [`ChatResponse`] or a [`CanonicalError`].

use crate::config::SecretString;
use crate::protocol::{ChatRequest, ChatResponse, ProviderId};
use crate::providers::error::{CanonicalError, ProviderResult};
use async_trait::async_trait;
use std::time::Duration;

/// Static, per-provider configuration; read-only after start-up
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    /// Base URL of the API (for the local daemon: its host)
    pub base_url: String,

    /// Model used when the request does not name one
    pub default_model: String,

    /// Credential, absent for the local daemon
    pub api_key: Option<SecretString>,

    /// Name of the variable the credential is read from, for operator hints
    pub credential_env: Option<String>,
}

impl AdapterConfig {
    /// Create a config without a credential
    pub fn new(base_url: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_model: default_model.into(),
            api_key: None,
            credential_env: None,
        }
    }

    /// Attach a credential
    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    /// Record where the credential comes from
    pub fn with_credential_env(mut self, name: impl Into<String>) -> Self {
        self.credential_env = Some(name.into());
        self
    }

    /// Whether a non-empty credential is configured
    pub fn has_credential(&self) -> bool {
        self.api_key.as_ref().is_some_and(|key| !key.is_empty())
    }

    /// The credential, or an `auth_error` naming the provider
    pub fn require_api_key(&self, provider: ProviderId) -> ProviderResult<&SecretString> {
        match self.api_key.as_ref().filter(|key| !key.is_empty()) {
            Some(key) => Ok(key),
            None => {
                let hint = self
                    .credential_env
                    .as_deref()
                    .map(|var| format!(". Set {var}"))
                    .unwrap_or_default();
                Err(CanonicalError::auth(format!(
                    "{} API key is not configured{}",
                    provider.display_name(),
                    hint
                )))
            }
        }
    }
}

/// Core trait every backend adapter implements
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter speaks to
    fn provider(&self) -> ProviderId;

    /// Perform one chat completion within `deadline`
    async fn invoke(
        &self,
        request: &ChatRequest,
        config: &AdapterConfig,
        deadline: Duration,
    ) -> ProviderResult<ChatResponse>;

    /// Report whether the backend looks usable
    ///
    /// The default is a presence check on the credential; no network call.
    async fn is_healthy(&self, config: &AdapterConfig, probe_timeout: Duration) -> bool {
        let _ = probe_timeout;
        config.has_credential()
    }
}
