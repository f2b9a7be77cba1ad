//! Error types for the gateway.

use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::domain::bulk::BulkItemFailure;
use crate::domain::schema::FieldError;
use crate::infra::search::BackendError;

/// Everything a gateway operation can fail with. Each variant maps to one
/// HTTP status; no variant is fatal to the process.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Candidate document violates the schema
    #[error("Validation failed with {} error(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Requested document does not exist
    #[error("Product {0} not found")]
    NotFound(String),

    /// Listing cursor is unknown or its lifetime ran out
    #[error("Scroll cursor expired or unknown: {}", .0.message)]
    CursorExpired(BackendError),

    /// Missing or malformed request parameter
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// At least one bulk item was refused
    #[error("Bulk submission had {} failed item(s)", .0.len())]
    BulkPartialFailure(Vec<BulkItemFailure>),

    /// Index engine error or transport failure
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl GatewayError {
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Validation(_) | GatewayError::BadRequest(_) => 400,
            GatewayError::NotFound(_) => 404,
            GatewayError::BulkPartialFailure(_) => 500,
            GatewayError::CursorExpired(e) | GatewayError::Backend(e) => e.status.unwrap_or(500),
        }
    }

    /// JSON body describing the failure. Backend errors keep the engine's own
    /// `error` object when it sent one, otherwise `fallback` is used.
    pub fn body(&self, fallback: &str) -> JsonValue {
        match self {
            GatewayError::Validation(errors) => json!(errors),
            GatewayError::NotFound(_) => json!({ "error": "Product not found" }),
            GatewayError::BadRequest(msg) => json!({ "error": msg }),
            GatewayError::BulkPartialFailure(failures) => json!({ "error": failures }),
            GatewayError::CursorExpired(e) | GatewayError::Backend(e) => match e.error_detail() {
                Some(detail) => json!({ "error": detail }),
                None => json!({ "error": fallback }),
            },
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::ViolationKind;

    #[test]
    fn test_status_codes() {
        let field = FieldError::new("title", ViolationKind::MissingRequired, "missing");
        assert_eq!(GatewayError::Validation(vec![field]).status_code(), 400);
        assert_eq!(GatewayError::NotFound("x".into()).status_code(), 404);
        assert_eq!(GatewayError::BadRequest("txt".into()).status_code(), 400);
        assert_eq!(GatewayError::BulkPartialFailure(vec![]).status_code(), 500);
        assert_eq!(
            GatewayError::Backend(BackendError::transport("refused")).status_code(),
            500
        );
        let engine = BackendError::new(503, json!({ "error": "unavailable" }), "unavailable");
        assert_eq!(GatewayError::Backend(engine).status_code(), 503);
    }

    #[test]
    fn test_backend_body_prefers_engine_error() {
        let engine = BackendError::new(
            404,
            json!({ "error": { "type": "index_not_found_exception" }, "status": 404 }),
            "no such index",
        );
        let body = GatewayError::Backend(engine).body("Failed to retrieve product");
        assert_eq!(body["error"]["type"], "index_not_found_exception");

        let body = GatewayError::Backend(BackendError::transport("refused"))
            .body("Failed to retrieve product");
        assert_eq!(body, json!({ "error": "Failed to retrieve product" }));
    }
}
