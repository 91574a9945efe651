//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Resolve secret → Build state → Bind listener
//!
//! Shutdown:
//!     signals.rs (SIGINT/SIGTERM) → shutdown.rs broadcast → server drains
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_on_signal;
