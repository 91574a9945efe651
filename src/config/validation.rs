//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (positive windows, limits and ttl; no overflowing products)
//! - Check the user list (non-empty, unique, well-formed)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// Longest token lifetime accepted: ten years.
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.auth.token_ttl_secs <= 0 {
        errors.push(ValidationError::new("auth.token_ttl_secs", "must be positive"));
    } else if config.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
        errors.push(ValidationError::new(
            "auth.token_ttl_secs",
            format!("must be at most {MAX_TOKEN_TTL_SECS}"),
        ));
    }

    if matches!(config.auth.secret.as_deref(), Some(s) if s.is_empty()) {
        errors.push(ValidationError::new("auth.secret", "must not be empty when set"));
    }

    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be positive"));
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be positive"));
    }

    if config.rate_limit.evict_after_windows == 0 {
        errors.push(ValidationError::new(
            "rate_limit.evict_after_windows",
            "must be positive",
        ));
    }

    // The eviction horizon is window_secs * evict_after_windows.
    if config
        .rate_limit
        .window_secs
        .checked_mul(u64::from(config.rate_limit.evict_after_windows))
        .is_none()
    {
        errors.push(ValidationError::new(
            "rate_limit.window_secs",
            "window_secs * evict_after_windows overflows",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be positive"));
    }

    if config.users.is_empty() {
        errors.push(ValidationError::new("users", "at least one user is required"));
    }

    let mut seen = HashSet::new();
    for (i, user) in config.users.iter().enumerate() {
        if user.username.trim().is_empty() {
            errors.push(ValidationError::new(format!("users[{i}].username"), "must not be empty"));
        } else if !seen.insert(user.username.as_str()) {
            errors.push(ValidationError::new(
                format!("users[{i}].username"),
                format!("duplicate username '{}'", user.username),
            ));
        }
        if user.password.is_empty() {
            errors.push(ValidationError::new(format!("users[{i}].password"), "must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
