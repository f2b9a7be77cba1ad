use crate::error::GatewayError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value as JsonValue};

pub fn status_of(err: &GatewayError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Maps a failure onto its status and a `{ "error": ... }` body
/// (validation failures become the bare error list).
pub fn error_response(err: &GatewayError, fallback: &str) -> Response {
    (status_of(err), Json(err.body(fallback))).into_response()
}

/// Like [`error_response`], but an engine error is relayed with the engine's
/// own body, untouched.
pub fn passthrough_response(err: &GatewayError, fallback: &str) -> Response {
    match err {
        GatewayError::Backend(e) | GatewayError::CursorExpired(e) => match &e.body {
            Some(body) if !body.is_null() => (status_of(err), Json(body.clone())).into_response(),
            _ => error_response(err, fallback),
        },
        other => error_response(other, fallback),
    }
}

/// Unwraps a JSON body, or answers with the extractor's own status.
pub fn json_body(body: Result<Json<JsonValue>, JsonRejection>) -> Result<JsonValue, Response> {
    match body {
        Ok(Json(v)) => Ok(v),
        Err(e) => Err((
            e.status(),
            Json(json!({ "error": format!("Invalid JSON body: {}", e.body_text()) })),
        )
            .into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::search::BackendError;

    #[test]
    fn test_passthrough_keeps_engine_body() {
        let err = GatewayError::Backend(BackendError::new(
            404,
            json!({ "_id": "x", "result": "not_found" }),
            "not found",
        ));
        let resp = passthrough_response(&err, "Failed");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_transport_failure_is_500() {
        let err = GatewayError::Backend(BackendError::transport("refused"));
        assert_eq!(status_of(&err), StatusCode::INTERNAL_SERVER_ERROR);
        let resp = passthrough_response(&err, "Failed");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_out_of_range_engine_status_falls_back() {
        let err = GatewayError::Backend(BackendError::new(42, JsonValue::Null, "odd"));
        assert_eq!(status_of(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
