use crate::domain::schema::{FieldError, SchemaVariant};
use crate::transport::http::handlers::common::{
    error_response, json_body, passthrough_response,
};
use crate::transport::http::types::{AppState, BackendAck, ErrorResponse, ProductDocument};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value as JsonValue;
use tracing::info;

#[utoipa::path(
    post,
    path = "/products/validate",
    request_body = ProductDocument,
    responses(
        (status = 200, description = "Product is valid; the normalized body is echoed", body = ProductDocument),
        (status = 400, description = "Every schema violation found", body = Vec<FieldError>)
    )
)]
pub async fn validate_product_handler(
    State(state): State<AppState>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> impl IntoResponse {
    let product = match json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    info!(product = %product, "Validating product");

    match state.product_service.validate(SchemaVariant::Create, &product) {
        Ok(normalized) => (StatusCode::OK, Json(normalized)).into_response(),
        Err(err) => error_response(&err, "Validation failed"),
    }
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = String, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "The product document", body = ProductDocument),
        (status = 404, description = "No product with this id", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    )
)]
pub async fn get_product_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.product_service.get_product(&id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(err) => error_response(&err, "Failed to retrieve product"),
    }
}

#[utoipa::path(
    post,
    path = "/products",
    request_body = ProductDocument,
    responses(
        (status = 200, description = "Backend acknowledgement", body = BackendAck),
        (status = 400, description = "Schema violations (strict write validation)", body = Vec<FieldError>),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    )
)]
pub async fn create_product_handler(
    State(state): State<AppState>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> impl IntoResponse {
    let product = match json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.product_service.create_product(product).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(err) => error_response(&err, "Failed to index product"),
    }
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    params(
        ("id" = String, Path, description = "Document id")
    ),
    request_body = ProductDocument,
    responses(
        (status = 200, description = "Backend acknowledgement", body = BackendAck),
        (status = 400, description = "Schema violations", body = Vec<FieldError>),
        (status = 404, description = "No product with this id", body = ErrorResponse)
    )
)]
pub async fn update_product_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> impl IntoResponse {
    let partial = match json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.product_service.update_product(&id, partial).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(err) => error_response(&err, "Failed to update product"),
    }
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(
        ("id" = String, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Backend acknowledgement", body = BackendAck),
        (status = 404, description = "Backend reply for an unknown id, relayed as is", body = BackendAck)
    )
)]
pub async fn delete_product_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.product_service.delete_product(&id).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(err) => passthrough_response(&err, "Failed to delete product"),
    }
}
