//! The product service.
//!
//! This module sits between the HTTP handlers and the index engine. It is
//! responsible for:
//! 1.  Gating writes through the product validator (per [`WriteValidation`]).
//! 2.  Translating requests into engine queries and engine responses into
//!     product pages and documents.
//! 3.  Mapping engine failures onto [`GatewayError`].
//!
//! The service holds no mutable state; one instance is shared by all requests.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::bulk::{self, BulkOutcome, BulkSummary};
use crate::domain::query::{self, ProductPage, SearchText, SCROLL_TTL};
use crate::domain::schema::{FieldError, ProductValidator, SchemaVariant};
use crate::error::{GatewayError, GatewayResult};
use crate::infra::config::WriteValidation;
use crate::infra::search::SearchBackend;

pub struct ProductService {
    backend: Arc<dyn SearchBackend>,
    validator: Arc<ProductValidator>,
    index: String,
    write_validation: WriteValidation,
}

impl ProductService {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        validator: Arc<ProductValidator>,
        index: impl Into<String>,
        write_validation: WriteValidation,
    ) -> Self {
        Self {
            backend,
            validator,
            index: index.into(),
            write_validation,
        }
    }

    /// Validates `candidate`, returning the normalized document or every violation.
    pub fn validate(&self, variant: SchemaVariant, candidate: &JsonValue) -> GatewayResult<JsonValue> {
        let result = self.validator.validate(variant, candidate);
        debug!(?variant, valid = result.is_valid(), "Validation outcome");
        result.into_result().map_err(GatewayError::Validation)
    }

    /// Document to write for a create, after the write gate.
    fn gate_create(&self, document: JsonValue) -> GatewayResult<JsonValue> {
        match self.write_validation {
            WriteValidation::Strict => self.validate(SchemaVariant::Create, &document),
            WriteValidation::Legacy => Ok(document),
        }
    }

    pub async fn get_product(&self, id: &str) -> GatewayResult<JsonValue> {
        info!(product_id = %id, "Fetching product");
        let response = self.backend.get(&self.index, id).await.map_err(|e| {
            error!(product_id = %id, error = %e, "Error retrieving product");
            GatewayError::from(e)
        })?;
        match query::document_from_get(&response) {
            Some(product) => Ok(product),
            None => {
                info!(product_id = %id, "Product not found");
                Err(GatewayError::NotFound(id.to_string()))
            }
        }
    }

    /// First listing page, opening a cursor for the following ones.
    pub async fn list_products(&self) -> GatewayResult<ProductPage> {
        info!("Fetching all products");
        let response = self
            .backend
            .search(&self.index, &query::list_query(), Some(SCROLL_TTL))
            .await
            .map_err(|e| {
                error!(error = %e, "Error retrieving all products");
                GatewayError::from(e)
            })?;
        let page = ProductPage::from_search_response(&response);
        info!(items = page.page.len(), total = page.total, "Products retrieved");
        Ok(page)
    }

    /// Advances a listing cursor. Returns the engine's page unmodified.
    pub async fn next_page(&self, cursor: &str) -> GatewayResult<JsonValue> {
        info!("Fetching next page");
        self.backend
            .scroll(cursor, SCROLL_TTL)
            .await
            .map_err(|e| {
                warn!(error = %e, "Scroll continuation failed");
                if e.is_not_found() {
                    GatewayError::CursorExpired(e)
                } else {
                    GatewayError::Backend(e)
                }
            })
    }

    pub async fn search_products(&self, text: &SearchText) -> GatewayResult<Vec<JsonValue>> {
        info!(txt = %text.as_str(), "Searching products");
        let response = self
            .backend
            .search(&self.index, &query::search_query(text), None)
            .await
            .map_err(|e| {
                error!(error = %e, "Product search failed");
                GatewayError::from(e)
            })?;
        Ok(query::hit_sources(&response))
    }

    pub async fn create_product(&self, document: JsonValue) -> GatewayResult<JsonValue> {
        let document = self.gate_create(document)?;
        let ack = self.backend.index(&self.index, &document).await.map_err(|e| {
            error!(error = %e, "Indexing product failed");
            GatewayError::from(e)
        })?;
        info!(product_id = ?ack.get("_id"), "Product indexed");
        Ok(ack)
    }

    /// Indexes all `documents` in one bulk request.
    ///
    /// Items the engine accepted stay written even when others fail; the
    /// failure lists only the refused items.
    pub async fn bulk_create(&self, documents: Vec<JsonValue>) -> GatewayResult<BulkSummary> {
        let documents = match self.write_validation {
            WriteValidation::Strict => self.validate_each(documents)?,
            WriteValidation::Legacy => documents,
        };

        let items = bulk::index_items(&self.index, documents);
        info!(items = items.len(), "Submitting bulk request");
        let response = self.backend.bulk(&items).await.map_err(|e| {
            error!(error = %e, "Bulk indexing failed");
            GatewayError::from(e)
        })?;

        match bulk::aggregate(&items, &response) {
            BulkOutcome::Success(summary) => {
                info!(count = summary.count, "Bulk indexing successful");
                Ok(summary)
            }
            BulkOutcome::PartialFailure(failures) => {
                warn!(failed = failures.len(), submitted = items.len(), "Bulk indexing partially failed");
                Err(GatewayError::BulkPartialFailure(failures))
            }
        }
    }

    fn validate_each(&self, documents: Vec<JsonValue>) -> GatewayResult<Vec<JsonValue>> {
        let mut normalized = Vec::with_capacity(documents.len());
        let mut errors: Vec<FieldError> = Vec::new();
        for (i, doc) in documents.iter().enumerate() {
            match self.validator.validate(SchemaVariant::Create, doc).into_result() {
                Ok(v) => normalized.push(v),
                Err(item_errors) => errors.extend(item_errors.into_iter().map(|mut e| {
                    e.path = if e.path == "$" {
                        format!("[{}]", i)
                    } else {
                        format!("[{}].{}", i, e.path)
                    };
                    e
                })),
            }
        }
        if errors.is_empty() {
            Ok(normalized)
        } else {
            Err(GatewayError::Validation(errors))
        }
    }

    /// Applies a partial update.
    ///
    /// Under [`WriteValidation::Legacy`] an invalid body is still applied and
    /// the validation errors are returned afterwards.
    pub async fn update_product(&self, id: &str, partial: JsonValue) -> GatewayResult<JsonValue> {
        info!(product_id = %id, "Updating product");
        let validated = self.validate(SchemaVariant::Update, &partial);

        match (self.write_validation, validated) {
            (_, Ok(normalized)) => self.apply_update(id, &normalized).await,
            (WriteValidation::Strict, Err(err)) => Err(err),
            (WriteValidation::Legacy, Err(err)) => {
                match self.apply_update(id, &partial).await {
                    Ok(ack) => warn!(product_id = %id, result = ?ack.get("result"), "Invalid update applied"),
                    Err(e) => warn!(product_id = %id, error = %e, "Invalid update attempted and failed"),
                }
                Err(err)
            }
        }
    }

    async fn apply_update(&self, id: &str, partial: &JsonValue) -> GatewayResult<JsonValue> {
        let ack = self
            .backend
            .update(&self.index, id, partial)
            .await
            .map_err(|e| {
                error!(product_id = %id, error = %e, "Update failed");
                GatewayError::from(e)
            })?;
        info!(product_id = %id, "Product updated");
        Ok(ack)
    }

    /// Deletes by id with no existence pre-check; the engine's answer is returned as is.
    pub async fn delete_product(&self, id: &str) -> GatewayResult<JsonValue> {
        info!(product_id = %id, "Deleting product");
        self.backend.delete(&self.index, id).await.map_err(|e| {
            warn!(product_id = %id, error = %e, "Delete failed");
            GatewayError::from(e)
        })
    }

    pub async fn health(&self) -> GatewayResult<()> {
        self.backend.ping().await.map_err(GatewayError::from)
    }
}
