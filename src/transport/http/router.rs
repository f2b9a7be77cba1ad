use crate::domain::bulk::{BulkItemFailure, BulkSummary};
use crate::domain::query::ProductPage;
use crate::domain::schema::{FieldError, ViolationKind};
use crate::transport::http::handlers::{bulk, health, listing, products, search};
use crate::transport::http::types::{
    AppState, BackendAck, ErrorResponse, HealthResponse, ProductDocument,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use serde_json::Value as JsonValue;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        products::validate_product_handler,
        products::get_product_handler,
        products::create_product_handler,
        products::update_product_handler,
        products::delete_product_handler,
        listing::list_products_handler,
        listing::next_page_handler,
        search::search_products_handler,
        bulk::bulk_create_handler
    ),
    components(schemas(
        ProductDocument,
        BackendAck,
        ErrorResponse,
        HealthResponse,
        FieldError,
        ViolationKind,
        ProductPage,
        BulkSummary,
        BulkItemFailure
    ))
)]
pub struct ApiDoc;

/// `/products/validate` and `/products/bulk` are also document ids: every
/// method other than POST on those paths goes to the document with that id.
fn with_id_methods(route: MethodRouter<AppState>, id: &'static str) -> MethodRouter<AppState> {
    route
        .get(move |state: State<AppState>| products::get_product_handler(state, Path(id.to_string())))
        .put(
            move |state: State<AppState>, body: Result<Json<JsonValue>, JsonRejection>| {
                products::update_product_handler(state, Path(id.to_string()), body)
            },
        )
        .delete(move |state: State<AppState>| {
            products::delete_product_handler(state, Path(id.to_string()))
        })
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route(
            "/products/validate",
            with_id_methods(post(products::validate_product_handler), "validate"),
        )
        .route(
            "/products/bulk",
            with_id_methods(post(bulk::bulk_create_handler), "bulk"),
        )
        .route(
            "/products",
            get(listing::list_products_handler).post(products::create_product_handler),
        )
        .route(
            "/products/:id",
            get(products::get_product_handler)
                .put(products::update_product_handler)
                .delete(products::delete_product_handler),
        )
        .route("/nextpage", get(listing::next_page_handler))
        .route("/product/search", get(search::search_products_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
