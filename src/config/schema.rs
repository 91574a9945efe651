//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the backend.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Root configuration for the backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Token signing and verification settings.
    pub auth: AuthConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub security: SecurityConfig,

    /// Cross-origin resource sharing.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// The fixed set of users allowed to log in.
    pub users: Vec<UserRecord>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            timeouts: TimeoutConfig::default(),
            security: SecurityConfig::default(),
            cors: CorsConfig::default(),
            observability: ObservabilityConfig::default(),
            users: default_users(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Deployment environment. Production refuses insecure defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Parses the value of the `APP_ENV` variable.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

/// Token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HMAC secret. Falls back to `JWT_SECRET`, then to a
    /// development-only default.
    #[serde(skip_serializing)]
    pub secret: Option<String>,

    /// Lifetime of issued tokens in seconds.
    pub token_ttl_secs: i64,

    /// Deployment environment.
    pub environment: Environment,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            token_ttl_secs: 3600,
            environment: Environment::Development,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Length of the fixed counting window in seconds.
    pub window_secs: u64,

    /// Requests admitted per key per window.
    pub max_requests: u32,

    /// Keys idle for this many windows are evicted.
    pub evict_after_windows: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 60,
            max_requests: 10,
            evict_after_windows: 3,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allow any origin, method and header.
    pub enabled: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Install the Prometheus recorder and serve `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}

/// A user allowed to log in.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
}

impl UserRecord {
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role,
        }
    }
}

fn default_users() -> Vec<UserRecord> {
    vec![
        UserRecord::new("admin", "admin", Role::Admin),
        UserRecord::new("user", "user", Role::User),
    ]
}
