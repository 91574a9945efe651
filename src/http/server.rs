//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build application state from validated configuration
//! - Create the Axum Router with every route and its guard policy
//! - Wire up middleware (request ID, tracing, timeout, CORS, body limit, metrics)
//! - Serve on a listener until the shutdown signal fires

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{Role, TokenVerifier, UserDirectory};
use crate::config::{resolve_secret, AppConfig, ConfigError};
use crate::http::handlers;
use crate::http::middleware::{route_guard, track_requests, RouteGuard};
use crate::http::request::{request_id, RequestUuid};
use crate::observability::metrics::MetricsExporter;
use crate::security::{Pipeline, RateLimiter, RoutePolicy};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub users: Arc<UserDirectory>,
    /// Present when the Prometheus recorder is installed.
    pub metrics: Option<MetricsExporter>,
}

impl AppState {
    /// Build state from configuration. Fails when no acceptable token secret
    /// is available.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let secret = resolve_secret(config)?;
        let verifier = Arc::new(TokenVerifier::new(&secret, config.auth.token_ttl_secs));
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));

        Ok(Self {
            pipeline: Pipeline::new(verifier, limiter),
            users: Arc::new(UserDirectory::new(&config.users)),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, exporter: MetricsExporter) -> Self {
        self.metrics = Some(exporter);
        self
    }
}

/// HTTP server for the backend.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        let state = AppState::from_config(&config)?;
        Ok(Self::with_state(config, state))
    }

    /// Create a server around prebuilt state.
    pub fn with_state(config: AppConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all routes and middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    let pipeline = state.pipeline.clone();
    let guard = move |policy: RoutePolicy| {
        middleware::from_fn_with_state(RouteGuard::new(pipeline.clone(), policy), route_guard)
    };

    let public = Router::new()
        .route("/api/hello", get(handlers::hello))
        .route("/api/login", post(handlers::login))
        .route_layer(guard(RoutePolicy::public()));

    let any_user = Router::new()
        .route("/api/time", get(handlers::time))
        .route_layer(guard(RoutePolicy::roles(&[Role::User, Role::Admin])));

    let admin_only = Router::new()
        .route("/api/echo", post(handlers::echo))
        .route_layer(guard(RoutePolicy::roles(&[Role::Admin])));

    let router = Router::new()
        .merge(public)
        .merge(any_user)
        .merge(admin_only)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(track_requests))
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size));

    let router = if config.cors.enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id(request),
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(RequestUuid))
}
