//! Configuration validation utilities

use super::schema::GatewayConfig;
use crate::error::{ValidationError, ValidationErrorKind};
use crate::protocol::ProviderId;
use std::net::SocketAddr;
use url::Url;

/// Configuration validator run once at start-up
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration
    pub fn validate(&self, config: &GatewayConfig) -> Result<(), ValidationError> {
        self.validate_providers(config)?;
        self.validate_timeouts(config)?;
        self.validate_server(config)?;
        Ok(())
    }

    fn validate_providers(&self, config: &GatewayConfig) -> Result<(), ValidationError> {
        for provider in ProviderId::ALL {
            let resolved = config.adapter_config(provider);
            let field = format!("providers.{}", provider.as_str());

            if resolved.default_model.trim().is_empty() {
                return Err(ValidationError::required(format!("{field}.default_model")));
            }

            // An empty daemon host means "local inference disabled"
            if provider.is_local() && resolved.base_url.is_empty() {
                continue;
            }

            let url = Url::parse(&resolved.base_url).map_err(|e| {
                ValidationError::new(
                    format!("{field}.base_url"),
                    ValidationErrorKind::InvalidUrl {
                        message: e.to_string(),
                    },
                )
            })?;

            if !matches!(url.scheme(), "http" | "https") {
                return Err(ValidationError::invalid_value(
                    format!("{field}.base_url"),
                    "an http or https URL",
                    url.scheme(),
                ));
            }
        }

        Ok(())
    }

    fn validate_timeouts(&self, config: &GatewayConfig) -> Result<(), ValidationError> {
        let timeouts = &config.timeouts;
        for (name, value) in [
            ("timeouts.cloud_secs", timeouts.cloud_secs),
            ("timeouts.local_secs", timeouts.local_secs),
            ("timeouts.connect_secs", timeouts.connect_secs),
            ("timeouts.health_probe_secs", timeouts.health_probe_secs),
        ] {
            if value == 0 {
                return Err(ValidationError::out_of_range(name, "must be at least 1 second"));
            }
        }

        if timeouts.local_secs < timeouts.cloud_secs {
            return Err(ValidationError::new(
                "timeouts.local_secs",
                ValidationErrorKind::Custom {
                    message: "local inference deadline must not be shorter than the cloud deadline"
                        .to_string(),
                },
            ));
        }

        Ok(())
    }

    fn validate_server(&self, config: &GatewayConfig) -> Result<(), ValidationError> {
        config
            .server
            .bind
            .parse::<SocketAddr>()
            .map_err(|e| ValidationError::invalid_format("server.bind", e.to_string()))?;
        Ok(())
    }
}
