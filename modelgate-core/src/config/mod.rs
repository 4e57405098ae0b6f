//! Configuration module for the gateway
//!
//! Configuration is loaded once at process start, either from environment
//! variables or from a YAML/JSON file with `${VAR}` interpolation, and is
//! read-only afterwards.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::{interpolate_env_vars, interpolate_with};
pub use error::{ConfigError, ConfigResult};
pub use schema::{
    GatewayConfig, ProviderDefaults, ProviderSettings, ProvidersConfig, ServerConfig,
    TimeoutConfig,
};
pub use secrets::{redact_credentials, SecretString, REDACTED};
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<GatewayConfig, ConfigError> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: GatewayConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<GatewayConfig, ConfigError> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: GatewayConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Load a configuration file, choosing the format from its extension
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<GatewayConfig, ConfigError> {
    let path = path.as_ref();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => load_from_json(path),
        Some("yaml") | Some("yml") => load_from_yaml(path),
        other => Err(ConfigError::Invalid {
            message: format!(
                "unsupported config file extension {:?} for '{}'; expected .yaml, .yml or .json",
                other.unwrap_or(""),
                path.display()
            ),
        }),
    }
}

fn read_interpolated(path: &Path) -> Result<String, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    // Interpolate environment variables before parsing
    interpolate_env_vars(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_yaml() {
        let yaml = r#"
providers:
  openai:
    api_key: sk-inline
    default_model: gpt-4o
  ollama:
    base_url: http://localhost:11434
timeouts:
  cloud_secs: 20
"#;
        let config: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.timeouts.cloud_secs, 20);
        assert_eq!(config.timeouts.local_secs, 120);
        assert_eq!(
            config.providers.openai.default_model.as_deref(),
            Some("gpt-4o")
        );
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = r#"
providers:
  cohere:
    api_key: x
"#;
        let config: Result<GatewayConfig, _> = serde_yaml::from_str(yaml);
        assert!(config.is_err());
    }
}
