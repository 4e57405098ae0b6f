//! # modelgate
//!
//! Serves the chat gateway over HTTP. Configuration comes from a YAML/JSON
//! file when `--config` is given, otherwise from environment variables.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use modelgate_core::config::load_from_file;
use modelgate_core::{GatewayConfig, ProviderId};
use modelgate_server::{router, AppState};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

/// Unified chat-completion gateway
#[derive(Parser)]
#[command(name = "modelgate")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a YAML or JSON configuration file
    #[arg(short, long, env = "MODELGATE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address, overrides the configured one
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "MODELGATE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_format)?;

    let mut config = match &cli.config {
        Some(path) => load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            GatewayConfig::from_env().context("Failed to load configuration from environment")?
        }
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    log_provider_summary(&config);

    let state = AppState::from_config(&config).context("Failed to initialize providers")?;
    let app = router(state, &config.server.cors_origins());

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind))?;

    info!(addr = %config.server.bind, "modelgate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("modelgate shutting down");

    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match format {
        LogFormat::Text => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

fn log_provider_summary(config: &GatewayConfig) {
    for provider in ProviderId::ALL {
        let adapter = config.adapter_config(provider);
        if provider.is_local() {
            match config.ollama_host() {
                Some(host) => info!(
                    %provider,
                    %host,
                    model = %adapter.default_model,
                    "Local daemon configured"
                ),
                None => warn!(%provider, "Local daemon disabled"),
            }
        } else if adapter.has_credential() {
            info!(%provider, model = %adapter.default_model, "Provider configured");
        } else {
            warn!(%provider, "No credential configured, requests will fail with auth_error");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
