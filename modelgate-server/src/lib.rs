//! HTTP surface for the gateway
//!
//! Endpoints:
//! - `POST /ai/chat` - dispatch one chat request
//! - `GET /health` - per-provider availability
//!
//! Errors are answered with `{severity, message}` and the status code that
//! belongs to the severity.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use modelgate_core::{
    CanonicalError, ChatResponse, Dispatcher, GatewayConfig, HealthReport, HealthReporter,
    HttpClient, ProviderRegistry, TimeoutPolicy, ValidationError,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub health: HealthReporter,
}

impl AppState {
    /// Wire the registry, dispatcher and health reporter from configuration
    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let http = HttpClient::with_config(config.timeouts.connect(), 10)?;
        let registry = Arc::new(ProviderRegistry::from_config(config, http));

        Ok(Self {
            dispatcher: Dispatcher::new(registry.clone(), TimeoutPolicy::from(&config.timeouts)),
            health: HealthReporter::new(
                registry,
                config.ollama_host(),
                config.timeouts.health_probe(),
            ),
        })
    }
}

/// Canonical error rendered as an HTTP response
pub struct ApiError(pub CanonicalError);

impl From<CanonicalError> for ApiError {
    fn from(err: CanonicalError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(self.0)).into_response()
    }
}

/// Build the router with CORS restricted to `allowed_origins`
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/ai/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        warn!("CORS allows any origin");
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    info!(count = origins.len(), "CORS origins configured");

    layer.allow_origin(AllowOrigin::list(origins))
}

async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    // Parsed by hand so a malformed body gets the canonical error shape
    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        CanonicalError::from(ValidationError::invalid_format("body", e.to_string()))
    })?;

    let response = state.dispatcher.dispatch_json(body).await?;
    Ok(Json(response))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.health.report().await)
}
