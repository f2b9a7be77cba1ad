use crate::app::product_service::ProductService;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone)]
pub struct AppState {
    pub product_service: Arc<ProductService>,
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct NextPageParams {
    /// Cursor returned as `scrollId` by `GET /products` or a previous page.
    #[serde(rename = "scrollId")]
    pub scroll_id: Option<String>,
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct SearchParams {
    /// Free text matched against title, brand and tags.
    pub txt: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ErrorResponse {
    #[schema(value_type = Object)]
    pub error: JsonValue,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Loosely-typed product document as sent by clients; validated server-side.
#[derive(Debug, ToSchema)]
#[schema(value_type = Object)]
pub struct ProductDocument(pub JsonValue);

/// Index engine reply, relayed unmodified.
#[derive(Debug, ToSchema)]
#[schema(value_type = Object)]
pub struct BackendAck(pub JsonValue);
