//! Centralized configuration (environment variables + defaults).

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{name} has invalid value '{value}': {reason}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
    pub reason: String,
}

/// How strictly write endpoints validate their bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteValidation {
    /// Every write is validated first and rejected with 400 before reaching the index.
    #[default]
    Strict,
    /// Historical behavior: creates and bulk writes are not validated, and an
    /// invalid update is still applied before the 400 is returned.
    Legacy,
}

impl FromStr for WriteValidation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(WriteValidation::Strict),
            "legacy" => Ok(WriteValidation::Legacy),
            other => Err(format!("expected 'strict' or 'legacy', got '{}'", other)),
        }
    }
}

/// Which index engine the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Elasticsearch,
    Memory,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "elasticsearch" | "elastic" => Ok(BackendKind::Elasticsearch),
            "memory" => Ok(BackendKind::Memory),
            other => Err(format!("expected 'elasticsearch' or 'memory', got '{}'", other)),
        }
    }
}

fn parsed_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: ToString,
{
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse::<T>().map_err(|e| ConfigError {
                name,
                value: value.clone(),
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

/// Elasticsearch base URL (default `http://localhost:9200`).
pub fn elasticsearch_url() -> String {
    std::env::var("ELASTICSEARCH_URL").unwrap_or_else(|_| "http://localhost:9200".to_string())
}

/// Per-request timeout of the Elasticsearch HTTP client (default 30s).
pub fn elasticsearch_timeout() -> Result<Duration, ConfigError> {
    parsed_or::<u64>("ELASTICSEARCH_TIMEOUT_SECS", 30).map(Duration::from_secs)
}

/// Name of the product index (default `products`).
pub fn products_index() -> String {
    std::env::var("PRODUCTS_INDEX").unwrap_or_else(|_| "products".to_string())
}

/// Port the API server binds (default 8080).
pub fn port() -> Result<u16, ConfigError> {
    parsed_or("PORT", 8080)
}

pub fn backend_kind() -> Result<BackendKind, ConfigError> {
    parsed_or("GATEWAY_BACKEND", BackendKind::default())
}

pub fn write_validation() -> Result<WriteValidation, ConfigError> {
    parsed_or("GATEWAY_WRITE_VALIDATION", WriteValidation::default())
}

/// Whether logs are emitted as JSON lines (`LOG_FORMAT=json`).
pub fn json_logs() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
