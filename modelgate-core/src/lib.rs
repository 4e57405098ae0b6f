//! ModelGate Core Library
//!
//! Unified chat-completion gateway: one request contract routed to OpenAI,
//! Anthropic, Gemini or a local Ollama daemon, with every failure folded into
//! a small canonical error taxonomy.
//!
//! The usual entry point is [`Dispatcher`], built from a [`ProviderRegistry`]
//! and a [`TimeoutPolicy`]. [`HealthReporter`] shares the same registry.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod http;
pub mod protocol;
pub mod providers;

pub use config::{GatewayConfig, SecretString};
pub use dispatch::{Dispatcher, TimeoutPolicy};
pub use error::{ValidationError, ValidationErrorKind};
pub use health::{HealthReport, HealthReporter};
pub use http::HttpClient;
pub use protocol::{ChatRequest, ChatResponse, ProviderId, RawChatRequest};
pub use providers::{CanonicalError, ProviderAdapter, ProviderRegistry, Severity};

/// Returns the version of the ModelGate core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
