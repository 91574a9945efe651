//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request on a guarded route:
//!     → auth::TokenVerifier (if the route requires a credential)
//!     → auth::authorize (if the route declares roles)
//!     → rate_limit.rs (always; keyed by identity or origin)
//!     → handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: the first failing stage rejects the request
//! - Stages are plain functions over explicit state; the axum adapter lives
//!   in `http::middleware::guard`

pub mod pipeline;
pub mod rate_limit;

pub use pipeline::{Pipeline, RoutePolicy};
pub use rate_limit::{RateKey, RateLimiter};
