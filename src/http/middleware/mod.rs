//! HTTP middleware.
//!
//! - guard.rs: per-route authorization pipeline (route_layer)
//! - request_metrics.rs: request counter and latency histogram (layer)

pub mod guard;
pub mod request_metrics;

pub use guard::{route_guard, RouteGuard};
pub use request_metrics::track_requests;
