//! Backend health reporting
//!
//! Cloud providers are judged on credential presence alone; the local daemon
//! is probed over the network with a short timeout. Probes never fail the
//! report, an unreachable backend simply reads as `false`.

use crate::protocol::ProviderId;
use crate::providers::registry::ProviderRegistry;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Snapshot returned by the health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub providers: BTreeMap<ProviderId, bool>,
    #[serde(rename = "ollamaHost")]
    pub ollama_host: Option<String>,
}

/// Probes every registered backend
#[derive(Clone)]
pub struct HealthReporter {
    registry: Arc<ProviderRegistry>,
    ollama_host: Option<String>,
    probe_timeout: Duration,
}

impl HealthReporter {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        ollama_host: Option<String>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            ollama_host: ollama_host.filter(|host| !host.is_empty()),
            probe_timeout,
        }
    }

    /// Availability of each registered provider, probed concurrently
    pub async fn check_all(&self) -> BTreeMap<ProviderId, bool> {
        let probes = self.registry.entries().map(|(provider, entry)| async move {
            let healthy = entry.adapter.is_healthy(&entry.config, self.probe_timeout).await;
            debug!(%provider, healthy, "Health probe finished");
            (provider, healthy)
        });

        join_all(probes).await.into_iter().collect()
    }

    pub async fn report(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            providers: self.check_all().await,
            ollama_host: self.ollama_host.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::http::HttpClient;

    #[tokio::test]
    async fn test_cloud_health_follows_credentials() {
        let mut config = GatewayConfig::default();
        config.providers.openai.api_key = Some("sk-test".into());
        // Nothing listens on port 1, so the daemon probe fails fast
        config.providers.ollama.base_url = Some("http://127.0.0.1:1".to_string());

        let registry = Arc::new(ProviderRegistry::from_config(
            &config,
            HttpClient::new().unwrap(),
        ));
        let reporter = HealthReporter::new(registry, config.ollama_host(), Duration::from_secs(2));
        let report = reporter.report().await;

        assert_eq!(report.status, "healthy");
        assert!(report.providers[&ProviderId::OpenAI]);
        assert!(!report.providers[&ProviderId::Anthropic]);
        assert!(!report.providers[&ProviderId::Gemini]);
        assert!(!report.providers[&ProviderId::Ollama]);
        assert_eq!(report.ollama_host.as_deref(), Some("http://127.0.0.1:1"));
    }

    #[test]
    fn test_report_serialization() {
        let report = HealthReport {
            status: "healthy",
            providers: BTreeMap::from([(ProviderId::OpenAI, true), (ProviderId::Ollama, false)]),
            ollama_host: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["providers"]["openai"], true);
        assert_eq!(json["providers"]["ollama"], false);
        assert!(json["ollamaHost"].is_null());
    }
}
