//! Bulk result aggregation.
//!
//! A bulk submission is successful only when the engine reports no item
//! errors. Otherwise only the failed items are reported, each with the
//! action line and document that were sent, so callers can resubmit them.
//! Items that did succeed stay written.

use serde::Serialize;
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::infra::search::BulkItem;

/// Success summary of a bulk submission.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BulkSummary {
    pub message: String,
    pub count: usize,
}

/// One item the engine refused.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BulkItemFailure {
    /// Zero-based position of the item in the submission.
    pub index: usize,
    pub status: u16,
    #[schema(value_type = Object)]
    pub error: JsonValue,
    #[schema(value_type = Object)]
    pub operation: JsonValue,
    #[schema(value_type = Object)]
    pub document: JsonValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BulkOutcome {
    Success(BulkSummary),
    PartialFailure(Vec<BulkItemFailure>),
}

/// Pairs an `index` action for `index` with every document.
pub fn index_items(index: &str, documents: Vec<JsonValue>) -> Vec<BulkItem> {
    documents
        .into_iter()
        .map(|doc| BulkItem::index(index, doc))
        .collect()
}

/// Splits a bulk response into a summary or the list of failed items.
pub fn aggregate(items: &[BulkItem], response: &JsonValue) -> BulkOutcome {
    let results = response
        .get("items")
        .and_then(JsonValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let flagged = response
        .get("errors")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false);

    let failures: Vec<BulkItemFailure> = results
        .iter()
        .enumerate()
        .filter_map(|(i, result)| {
            // Each result is `{ "<operation>": { ... } }`.
            let detail = result.as_object()?.values().next()?;
            let error = detail.get("error")?;
            let sent = items.get(i);
            Some(BulkItemFailure {
                index: i,
                status: detail
                    .get("status")
                    .and_then(JsonValue::as_u64)
                    .map(|s| s as u16)
                    .unwrap_or(500),
                error: error.clone(),
                operation: sent.map(|s| s.directive.clone()).unwrap_or(JsonValue::Null),
                document: sent.map(|s| s.document.clone()).unwrap_or(JsonValue::Null),
            })
        })
        .collect();

    if flagged || !failures.is_empty() {
        return BulkOutcome::PartialFailure(failures);
    }

    BulkOutcome::Success(BulkSummary {
        message: "Bulk indexing successful".to_string(),
        count: if results.is_empty() { items.len() } else { results.len() },
    })
}
