//! Guarded REST backend library.
//!
//! A small axum service whose routes pass through an authorization pipeline:
//! bearer token verification, role gating and per-identity rate limiting.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::AppConfig;
pub use error::{ApiError, AuthError};
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
pub use security::{Pipeline, RoutePolicy};
