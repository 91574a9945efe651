//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{AppConfig, Environment};
use crate::config::validation::{validate_config, ValidationError};

/// Secret used when neither the config file nor `JWT_SECRET` provides one.
/// Accepted in development only.
pub const DEFAULT_SECRET: &str = "my-secret-key";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("no token secret configured; set auth.secret or JWT_SECRET in production")]
    InsecureSecret,
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply `JWT_SECRET`, `APP_ENV` and `BIND_ADDRESS` overrides.
///
/// `lookup` is `std::env::var(..).ok()` in production; tests pass a map.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
        config.auth.secret = Some(secret);
    }

    if let Some(env) = lookup("APP_ENV") {
        match Environment::parse(&env) {
            Some(environment) => config.auth.environment = environment,
            None => tracing::warn!(value = %env, "Ignoring unrecognised APP_ENV"),
        }
    }

    if let Some(addr) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
}

/// Resolve the shared token secret, failing fast when production would run
/// on the built-in default.
pub fn resolve_secret(config: &AppConfig) -> Result<String, ConfigError> {
    match config.auth.secret.as_deref() {
        Some(secret) if !secret.is_empty() => Ok(secret.to_string()),
        _ if config.auth.environment == Environment::Production => {
            Err(ConfigError::InsecureSecret)
        }
        _ => {
            tracing::warn!(
                "No token secret configured; using the built-in development secret. \
                 Set JWT_SECRET before deploying."
            );
            Ok(DEFAULT_SECRET.to_string())
        }
    }
}
