//! Route handlers.
//!
//! Handlers run after the route guard, so authenticated routes can rely on
//! an `Identity` extension being present.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::http::extractors::ApiJson;
use crate::http::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimeResponse {
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub time: String,
}

/// GET /api/hello
pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello from backend!".to_string(),
    })
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let identity = state
        .users
        .authenticate(&request.username, &request.password)
        .ok_or_else(|| {
            tracing::info!(username = %request.username, "Login failed");
            ApiError::InvalidLogin
        })?;

    let verifier = state.pipeline.verifier();
    let token = verifier.issue(&identity)?;

    tracing::info!(username = %identity.username, role = %identity.role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_in: verifier.ttl_secs(),
    }))
}

/// GET /api/time
pub async fn time(Extension(identity): Extension<Identity>) -> Json<TimeResponse> {
    tracing::debug!(username = %identity.username, "Serving time");
    Json(TimeResponse {
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// POST /api/echo
pub async fn echo(
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Json<serde_json::Value> {
    tracing::debug!(username = %identity.username, "Echoing request body");
    Json(serde_json::json!({ "echo": body }))
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .metrics
        .as_ref()
        .map(|exporter| exporter.render())
        .unwrap_or_default();

    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
