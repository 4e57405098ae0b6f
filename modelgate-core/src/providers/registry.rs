//! Provider registry
//!
//! Static mapping from provider identifier to its adapter and configuration.
//! Built once at start-up and shared read-only across concurrent dispatches,
//! so it needs no synchronization.

use crate::config::GatewayConfig;
use crate::http::HttpClient;
use crate::protocol::ProviderId;
use crate::providers::adapter::{AdapterConfig, ProviderAdapter};
use crate::providers::{AnthropicAdapter, GeminiAdapter, OllamaAdapter, OpenAIAdapter};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// An adapter together with the configuration it is invoked with
#[derive(Clone)]
pub struct ProviderEntry {
    pub adapter: Arc<dyn ProviderAdapter>,
    pub config: Arc<AdapterConfig>,
}

/// Read-only registry of provider adapters
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    entries: BTreeMap<ProviderId, ProviderEntry>,
}

impl ProviderRegistry {
    /// Start an empty registry
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Register the four built-in adapters on one shared HTTP client
    pub fn from_config(config: &GatewayConfig, http: HttpClient) -> Self {
        info!("Initializing provider registry");

        let adapters: [Arc<dyn ProviderAdapter>; 4] = [
            Arc::new(OpenAIAdapter::new(http.clone())),
            Arc::new(AnthropicAdapter::new(http.clone())),
            Arc::new(GeminiAdapter::new(http.clone())),
            Arc::new(OllamaAdapter::new(http)),
        ];

        adapters
            .into_iter()
            .fold(Self::builder(), |builder, adapter| {
                let adapter_config = config.adapter_config(adapter.provider());
                builder.register(adapter, adapter_config)
            })
            .build()
    }

    /// Look up the entry for a provider
    pub fn resolve(&self, provider: ProviderId) -> Option<&ProviderEntry> {
        self.entries.get(&provider)
    }

    /// Registered providers in stable order
    pub fn providers(&self) -> impl Iterator<Item = ProviderId> + '_ {
        self.entries.keys().copied()
    }

    /// All registered entries in stable order
    pub fn entries(&self) -> impl Iterator<Item = (ProviderId, &ProviderEntry)> + '_ {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for [`ProviderRegistry`]
#[derive(Default)]
pub struct ProviderRegistryBuilder {
    entries: BTreeMap<ProviderId, ProviderEntry>,
}

impl ProviderRegistryBuilder {
    /// Register an adapter under the provider it reports
    pub fn register(mut self, adapter: Arc<dyn ProviderAdapter>, config: AdapterConfig) -> Self {
        let provider = adapter.provider();
        info!(
            %provider,
            default_model = %config.default_model,
            credential = config.has_credential(),
            "Registering provider"
        );

        let entry = ProviderEntry {
            adapter,
            config: Arc::new(config),
        };

        if self.entries.insert(provider, entry).is_some() {
            warn!(%provider, "Provider registered twice, keeping the last registration");
        }
        self
    }

    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            entries: self.entries,
        }
    }
}
