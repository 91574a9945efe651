//! Guarded backend (v1)
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ metrics ─▶ route guard ─▶ handler
//!                                                         │
//!                                     token ─▶ role ─▶ rate limit
//! ```
//!
//! Routes:
//! - `GET  /api/hello`  public
//! - `POST /api/login`  public, exchanges username/password for a token
//! - `GET  /api/time`   roles user, admin
//! - `POST /api/echo`   role admin
//! - `GET  /metrics`    Prometheus exposition

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use guarded_backend::config::{
    apply_env_overrides, load_config, validate_config, AppConfig, ConfigError,
};
use guarded_backend::http::{AppState, HttpServer};
use guarded_backend::lifecycle::{shutdown_on_signal, Shutdown};
use guarded_backend::observability;

#[derive(Parser, Debug)]
#[command(name = "guarded-backend")]
#[command(about = "REST backend with token auth, role gating and rate limiting", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "BACKEND_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    observability::logging::init_logging(&config.observability)?;

    tracing::info!("guarded-backend v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = ?config.auth.environment,
        users = config.users.len(),
        rate_limit_enabled = config.rate_limit.enabled,
        rate_limit_window_secs = config.rate_limit.window_secs,
        rate_limit_max_requests = config.rate_limit.max_requests,
        "Configuration loaded"
    );

    let mut state = AppState::from_config(&config).inspect_err(|e| {
        tracing::error!(error = %e, "Refusing to start");
    })?;

    if config.observability.metrics_enabled {
        match observability::metrics::install_recorder() {
            Ok(exporter) => state = state.with_metrics(exporter),
            Err(e) => tracing::error!(error = %e, "Failed to install metrics recorder"),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown_on_signal(shutdown));

    HttpServer::with_state(config, state)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
