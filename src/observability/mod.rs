//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → GET /metrics (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
