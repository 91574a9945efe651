//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, connect info)
//!     → request.rs (assign x-request-id)
//!     → middleware/request_metrics.rs (count, time)
//!     → middleware/guard.rs (authorization pipeline, per route)
//!     → handlers.rs (extractors.rs for JSON bodies)
//! ```

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::{RequestUuid, X_REQUEST_ID};
pub use server::{build_router, AppState, HttpServer};
