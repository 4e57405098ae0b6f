//! Request dispatcher
//!
//! The single entry point external plumbing calls: validate, resolve the
//! adapter, invoke it under a deadline, and hand back either a normalized
//! response or a canonical error. No retries happen here; a single upstream
//! failure is surfaced immediately.

use crate::config::TimeoutConfig;
use crate::error::ValidationError;
use crate::protocol::{
    validate, validate_json, ChatRequest, ChatResponse, ProviderId, RawChatRequest,
};
use crate::providers::error::{CanonicalError, ProviderResult};
use crate::providers::registry::{ProviderEntry, ProviderRegistry};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Per-request deadlines by provider class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Deadline for cloud APIs
    pub cloud: Duration,
    /// Deadline for the local daemon, longer since inference is CPU/GPU bound
    pub local: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}

impl From<&TimeoutConfig> for TimeoutPolicy {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            cloud: config.cloud(),
            local: config.local(),
        }
    }
}

impl TimeoutPolicy {
    /// Deadline applied to one invocation of `provider`
    pub fn deadline_for(&self, provider: ProviderId) -> Duration {
        if provider.is_local() {
            self.local
        } else {
            self.cloud
        }
    }
}

/// Validates requests and routes them to the registered adapter
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    timeouts: TimeoutPolicy,
}

impl Dispatcher {
    pub fn new(registry: Arc<ProviderRegistry>, timeouts: TimeoutPolicy) -> Self {
        Self { registry, timeouts }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Dispatch a request body that has not been deserialized yet
    pub async fn dispatch_json(&self, body: Value) -> ProviderResult<ChatResponse> {
        let request_id = Uuid::new_v4();
        let span = info_span!("dispatch", %request_id);

        async move {
            let request = validate_json(body).map_err(reject)?;
            self.invoke(request).await
        }
        .instrument(span)
        .await
    }

    /// Dispatch a raw request
    pub async fn dispatch(&self, raw: RawChatRequest) -> ProviderResult<ChatResponse> {
        let request_id = Uuid::new_v4();
        let span = info_span!("dispatch", %request_id);

        async move {
            let request = validate(raw).map_err(reject)?;
            self.invoke(request).await
        }
        .instrument(span)
        .await
    }

    async fn invoke(&self, request: ChatRequest) -> ProviderResult<ChatResponse> {
        let provider = request.provider;

        // Mirrors provider validation in case the registry and the enum drift apart
        let ProviderEntry { adapter, config } =
            self.registry.resolve(provider).cloned().ok_or_else(|| {
                warn!(%provider, "No adapter registered");
                CanonicalError::unsupported_provider(provider, self.registry.providers())
            })?;

        let deadline = self.timeouts.deadline_for(provider);
        info!(
            %provider,
            model = request.model.as_deref().unwrap_or("default"),
            max_tokens = request.max_tokens,
            deadline_ms = deadline.as_millis() as u64,
            "Routing request"
        );

        let started = Instant::now();
        let mut task = tokio::spawn(
            async move { adapter.invoke(&request, &config, deadline).await }.in_current_span(),
        );

        let result = match tokio::time::timeout(deadline, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                error!(%provider, error = %join_error, "Adapter task failed");
                Err(CanonicalError::upstream(format!(
                    "{} request failed: internal adapter fault",
                    provider.display_name()
                )))
            }
            Err(_) => {
                task.abort();
                Err(CanonicalError::timeout(provider, deadline))
            }
        };

        let latency_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(response) => info!(
                %provider,
                model = %response.model,
                latency_ms,
                "Request completed"
            ),
            Err(err) => warn!(
                %provider,
                severity = %err.severity,
                latency_ms,
                error = %err,
                "Request failed"
            ),
        }

        result
    }
}

fn reject(err: ValidationError) -> CanonicalError {
    warn!(error = %err, "Rejected invalid request");
    CanonicalError::from(err)
}
