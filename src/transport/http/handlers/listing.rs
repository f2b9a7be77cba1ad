use crate::domain::query::ProductPage;
use crate::transport::http::handlers::common::{error_response, passthrough_response};
use crate::transport::http::types::{AppState, BackendAck, ErrorResponse, NextPageParams};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "First page (50 products, ordered by code) and a cursor for the next", body = ProductPage),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    )
)]
pub async fn list_products_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.product_service.list_products().await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => error_response(&err, "Failed to retrieve products"),
    }
}

#[utoipa::path(
    get,
    path = "/nextpage",
    params(NextPageParams),
    responses(
        (status = 200, description = "Next page as returned by the backend", body = BackendAck),
        (status = 404, description = "Cursor expired or unknown; backend reply relayed as is", body = BackendAck)
    )
)]
pub async fn next_page_handler(
    State(state): State<AppState>,
    Query(params): Query<NextPageParams>,
) -> impl IntoResponse {
    // A missing cursor goes to the backend as empty and fails there.
    let cursor = params.scroll_id.unwrap_or_default();
    match state.product_service.next_page(&cursor).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => passthrough_response(&err, "Failed to fetch next page"),
    }
}
