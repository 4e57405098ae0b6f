//! Configuration schema structures with serde support

use super::error::ConfigError;
use super::secrets::SecretString;
use crate::protocol::ProviderId;
use crate::providers::adapter::AdapterConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure for the gateway
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Per-provider settings
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Deadlines applied to outbound calls
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Settings consumed by the HTTP surface
    #[serde(default)]
    pub server: ServerConfig,
}

/// Settings for every known provider
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderSettings,

    #[serde(default)]
    pub anthropic: ProviderSettings,

    #[serde(default)]
    pub gemini: ProviderSettings,

    #[serde(default)]
    pub ollama: ProviderSettings,
}

impl ProvidersConfig {
    /// Settings for one provider
    pub fn get(&self, provider: ProviderId) -> &ProviderSettings {
        match provider {
            ProviderId::OpenAI => &self.openai,
            ProviderId::Anthropic => &self.anthropic,
            ProviderId::Gemini => &self.gemini,
            ProviderId::Ollama => &self.ollama,
        }
    }

    /// Mutable settings for one provider
    pub fn get_mut(&mut self, provider: ProviderId) -> &mut ProviderSettings {
        match provider {
            ProviderId::OpenAI => &mut self.openai,
            ProviderId::Anthropic => &mut self.anthropic,
            ProviderId::Gemini => &mut self.gemini,
            ProviderId::Ollama => &mut self.ollama,
        }
    }
}

/// Settings for a single provider; unset fields fall back to built-in defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    /// API key (supports environment variable interpolation)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Base URL for the provider API. For Ollama this is the daemon host; an
    /// empty string disables the local daemon.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model used when a request does not name one
    #[serde(default)]
    pub default_model: Option<String>,
}

/// Built-in defaults per provider
pub struct ProviderDefaults {
    pub base_url: &'static str,
    pub default_model: &'static str,
    pub credential_env: Option<&'static str>,
}

impl ProviderDefaults {
    pub fn for_provider(provider: ProviderId) -> Self {
        match provider {
            ProviderId::OpenAI => Self {
                base_url: "https://api.openai.com/v1",
                default_model: "gpt-4o-mini",
                credential_env: Some("OPENAI_API_KEY"),
            },
            ProviderId::Anthropic => Self {
                base_url: "https://api.anthropic.com/v1",
                default_model: "claude-3-5-sonnet-20241022",
                credential_env: Some("ANTHROPIC_API_KEY"),
            },
            ProviderId::Gemini => Self {
                base_url: "https://generativelanguage.googleapis.com/v1beta",
                default_model: "gemini-1.5-flash",
                credential_env: Some("GEMINI_API_KEY"),
            },
            ProviderId::Ollama => Self {
                base_url: "http://localhost:11434",
                default_model: "llama3.2:3b",
                credential_env: None,
            },
        }
    }
}

/// Deadlines for outbound calls, in seconds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Per-request deadline for cloud providers
    #[serde(default = "default_cloud_timeout")]
    pub cloud_secs: u64,

    /// Per-request deadline for the local daemon
    #[serde(default = "default_local_timeout")]
    pub local_secs: u64,

    /// TCP connect timeout for the shared client
    #[serde(default = "default_connect_timeout")]
    pub connect_secs: u64,

    /// Timeout for the local daemon health probe
    #[serde(default = "default_health_probe_timeout")]
    pub health_probe_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            cloud_secs: default_cloud_timeout(),
            local_secs: default_local_timeout(),
            connect_secs: default_connect_timeout(),
            health_probe_secs: default_health_probe_timeout(),
        }
    }
}

impl TimeoutConfig {
    pub fn cloud(&self) -> Duration {
        Duration::from_secs(self.cloud_secs)
    }

    pub fn local(&self) -> Duration {
        Duration::from_secs(self.local_secs)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn health_probe(&self) -> Duration {
        Duration::from_secs(self.health_probe_secs)
    }
}

/// Settings for the HTTP surface; not read by the dispatch core
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Comma separated CORS origins
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl ServerConfig {
    /// Allowed origins as a list, blanks removed
    pub fn cors_origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl GatewayConfig {
    /// Build configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    ///
    /// Recognised variables: `<P>_API_KEY`, `<P>_BASE_URL`, `DEFAULT_<P>_MODEL`
    /// for each provider `P`, `OLLAMA_HOST`, `ALLOWED_ORIGINS`, `MODELGATE_BIND`,
    /// `MODELGATE_CLOUD_TIMEOUT_SECS` and `MODELGATE_LOCAL_TIMEOUT_SECS`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = GatewayConfig::default();

        for provider in ProviderId::ALL {
            let prefix = provider.as_str().to_ascii_uppercase();
            let settings = config.providers.get_mut(provider);

            settings.api_key = lookup(&format!("{prefix}_API_KEY"))
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::new);
            settings.base_url = lookup(&format!("{prefix}_BASE_URL"));
            settings.default_model = lookup(&format!("DEFAULT_{prefix}_MODEL"))
                .filter(|model| !model.trim().is_empty());
        }

        // The daemon is addressed by host; OLLAMA_HOST="" disables it
        if let Some(host) = lookup("OLLAMA_HOST") {
            config.providers.ollama.base_url = Some(host.trim().to_string());
        }

        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            config.server.allowed_origins = origins;
        }
        if let Some(bind) = lookup("MODELGATE_BIND") {
            config.server.bind = bind;
        }
        if let Some(secs) = lookup("MODELGATE_CLOUD_TIMEOUT_SECS") {
            config.timeouts.cloud_secs = parse_secs("MODELGATE_CLOUD_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("MODELGATE_LOCAL_TIMEOUT_SECS") {
            config.timeouts.local_secs = parse_secs("MODELGATE_LOCAL_TIMEOUT_SECS", &secs)?;
        }

        super::ConfigValidator::new().validate(&config)?;
        Ok(config)
    }

    /// Resolve the effective adapter configuration for a provider
    pub fn adapter_config(&self, provider: ProviderId) -> AdapterConfig {
        let settings = self.providers.get(provider);
        let defaults = ProviderDefaults::for_provider(provider);

        let mut base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| defaults.base_url.to_string())
            .trim_end_matches('/')
            .to_string();
        // The daemon accepts a bare `host:port`, as its own CLI does
        if provider.is_local() && !base_url.is_empty() && !base_url.contains("://") {
            base_url = format!("http://{base_url}");
        }

        AdapterConfig {
            base_url,
            default_model: settings
                .default_model
                .clone()
                .unwrap_or_else(|| defaults.default_model.to_string()),
            api_key: settings.api_key.clone().filter(|key| !key.is_empty()),
            credential_env: defaults.credential_env.map(str::to_string),
        }
    }

    /// The configured local daemon host, `None` when disabled
    pub fn ollama_host(&self) -> Option<String> {
        Some(self.adapter_config(ProviderId::Ollama).base_url).filter(|host| !host.is_empty())
    }
}

fn parse_secs(var: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
        message: format!("{var} must be a whole number of seconds, got '{value}'"),
    })
}

// Default value functions for serde
fn default_cloud_timeout() -> u64 { 30 }
fn default_local_timeout() -> u64 { 120 }
fn default_connect_timeout() -> u64 { 10 }
fn default_health_probe_timeout() -> u64 { 2 }
fn default_bind() -> String { "0.0.0.0:8000".to_string() }
fn default_allowed_origins() -> String {
    "http://localhost:3000,http://localhost:8000".to_string()
}
