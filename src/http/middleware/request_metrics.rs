//! Router-wide request counting.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;

/// Label used for requests that matched no route.
const UNMATCHED: &str = "unmatched";

/// Counts every request and records its latency, labelled by route pattern.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED.to_owned());
    let method = request.method().to_string();

    metrics::record_request(&path, &method);
    let response = next.run(request).await;
    metrics::record_duration(&path, &method, response.status().as_u16(), start);

    response
}
