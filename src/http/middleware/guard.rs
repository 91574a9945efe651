//! Axum adapter for the authorization pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
    RequestExt,
};

use crate::security::{Pipeline, RoutePolicy};

/// Per-route middleware state: the shared pipeline plus this route's policy.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    pipeline: Pipeline,
    policy: Arc<RoutePolicy>,
}

impl RouteGuard {
    pub fn new(pipeline: Pipeline, policy: RoutePolicy) -> Self {
        Self {
            pipeline,
            policy: Arc::new(policy),
        }
    }
}

/// Runs the pipeline and either rejects the request or forwards it with the
/// verified `Identity` in its extensions.
pub async fn route_guard(
    State(guard): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let origin = request
        .extract_parts::<ConnectInfo<SocketAddr>>()
        .await
        .ok()
        .map(|ConnectInfo(addr)| addr.ip());

    let outcome = {
        // A header that isn't valid UTF-8 counts as no credential.
        let authorization = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        guard.pipeline.check(&guard.policy, authorization, origin)
    };

    match outcome {
        Ok(identity) => {
            if let Some(identity) = identity {
                tracing::debug!(
                    username = %identity.username,
                    role = %identity.role,
                    "Request authorized"
                );
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Err(rejection) => {
            tracing::warn!(
                reason = rejection.reason(),
                method = %request.method(),
                path = %request.uri().path(),
                "Request rejected"
            );
            rejection.into_response()
        }
    }
}
