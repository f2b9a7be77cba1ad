//! Document index backends.
//!
//! The gateway talks to the index engine only through [`SearchBackend`]. Two
//! implementations exist: [`ElasticBackend`] for a remote Elasticsearch
//! cluster and [`MemoryBackend`], an in-process engine with the same request
//! and response shapes.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

pub mod elastic;
pub mod fuzzy;
pub mod memory;

pub use elastic::ElasticBackend;
pub use memory::MemoryBackend;

/// Error reported by (or while talking to) the index engine.
///
/// `status` and `body` are the engine's own HTTP status and JSON body when it
/// answered; both are `None` for transport failures.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub status: Option<u16>,
    pub body: Option<JsonValue>,
    pub message: String,
}

impl BackendError {
    pub fn new(status: u16, body: JsonValue, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(body),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            message: message.into(),
        }
    }

    /// The engine's `error` object, when the body carried one.
    pub fn error_detail(&self) -> Option<&JsonValue> {
        self.body.as_ref().and_then(|b| b.get("error"))
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// One entry of a bulk request: the action line and its document.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItem {
    pub directive: JsonValue,
    pub document: JsonValue,
}

impl BulkItem {
    /// An `index` action targeting `index` with an engine-generated id.
    pub fn index(index: &str, document: JsonValue) -> Self {
        Self {
            directive: serde_json::json!({ "index": { "_index": index } }),
            document,
        }
    }
}

/// Operations the gateway needs from the index engine.
///
/// Responses are the engine's JSON bodies, passed back largely unmodified.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Point lookup. A missing document is `Ok` with `"found": false`.
    async fn get(&self, index: &str, id: &str) -> BackendResult<JsonValue>;

    /// Runs a query body. With `scroll` set, opens a cursor kept alive for that long.
    async fn search(
        &self,
        index: &str,
        body: &JsonValue,
        scroll: Option<&str>,
    ) -> BackendResult<JsonValue>;

    /// Advances a scroll cursor and extends its lifetime by `ttl`.
    async fn scroll(&self, cursor: &str, ttl: &str) -> BackendResult<JsonValue>;

    /// Indexes a document under an engine-generated id.
    async fn index(&self, index: &str, document: &JsonValue) -> BackendResult<JsonValue>;

    async fn bulk(&self, items: &[BulkItem]) -> BackendResult<JsonValue>;

    /// Merges `partial` into the stored document.
    async fn update(&self, index: &str, id: &str, partial: &JsonValue)
        -> BackendResult<JsonValue>;

    async fn delete(&self, index: &str, id: &str) -> BackendResult<JsonValue>;

    async fn ping(&self) -> BackendResult<()>;
}

/// Parses an engine duration such as `15m`, `30s` or `1h`.
pub fn parse_ttl(ttl: &str) -> Option<std::time::Duration> {
    let ttl = ttl.trim();
    let split = ttl.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = ttl.split_at(split);
    let n: u64 = digits.parse().ok()?;
    let secs = match unit {
        "ms" => return Some(std::time::Duration::from_millis(n)),
        "s" => n,
        "m" => n * 60,
        "h" => n * 3600,
        "d" => n * 86_400,
        _ => return None,
    };
    Some(std::time::Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl("15m"), Some(Duration::from_secs(900)));
        assert_eq!(parse_ttl("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_ttl("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_ttl("15"), None);
        assert_eq!(parse_ttl("m"), None);
        assert_eq!(parse_ttl("2w"), None);
    }

    #[test]
    fn test_error_detail() {
        let err = BackendError::new(
            404,
            serde_json::json!({ "error": { "type": "index_not_found_exception" }, "status": 404 }),
            "no such index",
        );
        assert!(err.is_not_found());
        assert_eq!(err.error_detail().unwrap()["type"], "index_not_found_exception");
        assert!(BackendError::transport("connection refused").error_detail().is_none());
    }
}
