//! Translation of gateway requests into index-engine query bodies, and of
//! engine responses back into product pages.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use utoipa::ToSchema;

use crate::error::GatewayError;

/// Documents per listing page.
pub const PAGE_SIZE: usize = 50;

/// Lifetime of a listing cursor, renewed on every continuation.
pub const SCROLL_TTL: &str = "15m";

/// Sort key that keeps page order stable across continuations.
pub const SORT_KEY: &str = "code.keyword";

/// Fields searched by full-text search. The brand is matched both at the top
/// level and inside `specifications`.
pub const SEARCH_FIELDS: [&str; 4] = ["title", "brand", "specifications.brand", "tags"];

/// Query body for the first page of the product listing.
pub fn list_query() -> JsonValue {
    json!({
        "query": { "match_all": {} },
        "size": PAGE_SIZE,
        "sort": [{ SORT_KEY: "asc" }]
    })
}

/// A validated full-text search string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchText(String);

impl SearchText {
    /// Accepts any non-empty query string; a missing or empty one is a bad request.
    pub fn parse(raw: Option<&str>) -> Result<Self, GatewayError> {
        match raw {
            Some(s) if !s.is_empty() => Ok(Self(s.to_string())),
            _ => Err(GatewayError::BadRequest(
                "txt parameter cannot be empty".to_string(),
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Multi-field fuzzy query; fuzziness scales with term length.
pub fn search_query(text: &SearchText) -> JsonValue {
    json!({
        "query": {
            "multi_match": {
                "query": text.as_str(),
                "fields": SEARCH_FIELDS,
                "fuzziness": "AUTO"
            }
        }
    })
}

/// `_source` of a get response, or `None` when the document was not found.
pub fn document_from_get(response: &JsonValue) -> Option<JsonValue> {
    if response.get("found").and_then(JsonValue::as_bool) != Some(true) {
        return None;
    }
    response.get("_source").cloned()
}

/// `_source` of every hit in a search or scroll response, in engine order.
pub fn hit_sources(response: &JsonValue) -> Vec<JsonValue> {
    response
        .pointer("/hits/hits")
        .and_then(JsonValue::as_array)
        .map(|hits| hits.iter().filter_map(|h| h.get("_source").cloned()).collect())
        .unwrap_or_default()
}

/// Total hit count; accepts both `{"value": n}` and bare-number forms.
pub fn total_hits(response: &JsonValue) -> u64 {
    match response.pointer("/hits/total") {
        Some(JsonValue::Number(n)) => n.as_u64().unwrap_or(0),
        Some(total) => total.get("value").and_then(JsonValue::as_u64).unwrap_or(0),
        None => 0,
    }
}

/// One page of the product listing.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProductPage {
    pub total: u64,
    #[serde(rename = "scrollId")]
    pub scroll_id: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub page: Vec<JsonValue>,
}

impl ProductPage {
    pub fn from_search_response(response: &JsonValue) -> Self {
        Self {
            total: total_hits(response),
            scroll_id: response
                .get("_scroll_id")
                .and_then(JsonValue::as_str)
                .map(str::to_string),
            page: hit_sources(response),
        }
    }
}
