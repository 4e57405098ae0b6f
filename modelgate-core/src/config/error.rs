//! Configuration error types

use crate::error::ValidationError;
use thiserror::Error;

/// Failure to load or validate the gateway configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse '{path}'{}: {message}", location(.line, .column))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("environment variable '{var}' referenced by the config is not set")]
    EnvVarNotFound { var: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" at line {line}, column {column}"),
        (Some(line), None) => format!(" at line {line}"),
        _ => String::new(),
    }
}
