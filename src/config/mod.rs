//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (JWT_SECRET / APP_ENV / BIND_ADDRESS overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → consumed once by AppState::from_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, parse_config, resolve_secret, ConfigError};
pub use schema::{
    AppConfig, AuthConfig, CorsConfig, Environment, ListenerConfig, LogFormat,
    ObservabilityConfig, RateLimitConfig, SecurityConfig, TimeoutConfig, UserRecord,
};
pub use validation::{validate_config, ValidationError, MAX_TOKEN_TTL_SECS};
