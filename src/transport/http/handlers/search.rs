use crate::domain::query::SearchText;
use crate::transport::http::handlers::common::error_response;
use crate::transport::http::types::{AppState, ErrorResponse, ProductDocument, SearchParams};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Fuzzy full-text search over title, brand and tags.
///
/// A backend failure is reported inline with status 200 (`"errors:<message>"`),
/// which existing clients rely on.
#[utoipa::path(
    get,
    path = "/product/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching products, best match first", body = Vec<ProductDocument>),
        (status = 400, description = "txt missing or empty", body = ErrorResponse)
    )
)]
pub async fn search_products_handler(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> impl IntoResponse {
    let raw = match &params {
        Ok(Query(p)) => p.txt.as_deref(),
        Err(_) => None,
    };
    let text = match SearchText::parse(raw) {
        Ok(t) => t,
        Err(err) => return error_response(&err, "Invalid search text"),
    };

    match state.product_service.search_products(&text).await {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(err) => (StatusCode::OK, Json(json!(format!("errors:{}", err)))).into_response(),
    }
}
