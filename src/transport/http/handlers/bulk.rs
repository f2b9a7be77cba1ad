use crate::domain::bulk::{BulkItemFailure, BulkSummary};
use crate::domain::schema::FieldError;
use crate::error::GatewayError;
use crate::transport::http::handlers::common::{error_response, json_body};
use crate::transport::http::types::{AppState, ProductDocument};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value as JsonValue;

/// Indexes an array of products in one backend request.
///
/// When any item fails the whole call answers 500 with the failed items only;
/// the other items remain indexed and must not be resubmitted.
#[utoipa::path(
    post,
    path = "/products/bulk",
    request_body = Vec<ProductDocument>,
    responses(
        (status = 200, description = "Every document indexed", body = BulkSummary),
        (status = 400, description = "Body is not an array, or schema violations (paths prefixed with the item position)", body = Vec<FieldError>),
        (status = 500, description = "Failed items, `{ \"error\": [...] }`", body = Vec<BulkItemFailure>)
    )
)]
pub async fn bulk_create_handler(
    State(state): State<AppState>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> impl IntoResponse {
    let documents = match json_body(body) {
        Ok(JsonValue::Array(docs)) => docs,
        Ok(_) => {
            let err = GatewayError::BadRequest(
                "request body must be an array of documents".to_string(),
            );
            return error_response(&err, "Bulk indexing failed");
        }
        Err(resp) => return resp,
    };

    match state.product_service.bulk_create(documents).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(&err, "Bulk indexing failed"),
    }
}
