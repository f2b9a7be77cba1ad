//! Elasticsearch REST backend.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::time::Duration;
use url::Url;

use super::{BackendError, BackendResult, BulkItem, SearchBackend};

/// [`SearchBackend`] backed by an Elasticsearch cluster over HTTP.
pub struct ElasticBackend {
    client: Client,
    base_url: Url,
}

impl ElasticBackend {
    pub fn new(base_url: &str, timeout: Duration) -> BackendResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BackendError::transport(format!("Invalid Elasticsearch URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::transport(format!(
                "Elasticsearch URL {} cannot be used as a base",
                base_url
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    pub async fn index_exists(&self, index: &str) -> BackendResult<bool> {
        let response = self
            .client
            .head(self.endpoint(&[index]))
            .send()
            .await
            .map_err(transport_error)?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(BackendError::new(
                status.as_u16(),
                JsonValue::Null,
                format!("Unexpected status {} checking index {}", status, index),
            )),
        }
    }

    pub async fn create_index(&self, index: &str, body: &JsonValue) -> BackendResult<JsonValue> {
        self.send(self.client.put(self.endpoint(&[index])).json(body))
            .await
    }

    async fn send(&self, request: RequestBuilder) -> BackendResult<JsonValue> {
        let (status, body) = self.send_raw(request).await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(status_error(status, body))
        }
    }

    async fn send_raw(&self, request: RequestBuilder) -> BackendResult<(StatusCode, JsonValue)> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        let body = if text.trim().is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| json!({ "error": text }))
        };
        Ok((status, body))
    }
}

impl fmt::Debug for ElasticBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticBackend")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[async_trait]
impl SearchBackend for ElasticBackend {
    async fn get(&self, index: &str, id: &str) -> BackendResult<JsonValue> {
        let request = self.client.get(self.endpoint(&[index, "_doc", id]));
        let (status, body) = self.send_raw(request).await?;
        // A missing document is a 404 carrying `"found": false`; a missing
        // index is a 404 carrying an `error` object.
        if status.is_success() || (status == StatusCode::NOT_FOUND && body.get("found").is_some()) {
            Ok(body)
        } else {
            Err(status_error(status, body))
        }
    }

    async fn search(
        &self,
        index: &str,
        body: &JsonValue,
        scroll: Option<&str>,
    ) -> BackendResult<JsonValue> {
        let mut request = self
            .client
            .post(self.endpoint(&[index, "_search"]))
            .json(body);
        if let Some(ttl) = scroll {
            request = request.query(&[("scroll", ttl)]);
        }
        self.send(request).await
    }

    async fn scroll(&self, cursor: &str, ttl: &str) -> BackendResult<JsonValue> {
        let request = self
            .client
            .post(self.endpoint(&["_search", "scroll"]))
            .json(&json!({ "scroll": ttl, "scroll_id": cursor }));
        self.send(request).await
    }

    async fn index(&self, index: &str, document: &JsonValue) -> BackendResult<JsonValue> {
        let request = self
            .client
            .post(self.endpoint(&[index, "_doc"]))
            .json(document);
        self.send(request).await
    }

    async fn bulk(&self, items: &[BulkItem]) -> BackendResult<JsonValue> {
        let payload = ndjson_payload(items);
        let request = self
            .client
            .post(self.endpoint(&["_bulk"]))
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(payload);
        self.send(request).await
    }

    async fn update(
        &self,
        index: &str,
        id: &str,
        partial: &JsonValue,
    ) -> BackendResult<JsonValue> {
        let request = self
            .client
            .post(self.endpoint(&[index, "_update", id]))
            .json(&json!({ "doc": partial }));
        self.send(request).await
    }

    async fn delete(&self, index: &str, id: &str) -> BackendResult<JsonValue> {
        let request = self.client.delete(self.endpoint(&[index, "_doc", id]));
        self.send(request).await
    }

    async fn ping(&self) -> BackendResult<()> {
        self.send(self.client.get(self.base_url.clone())).await.map(|_| ())
    }
}

/// Bulk request body: an action line followed by its source line for every
/// item. The source line is written even when the document is `null` or not an
/// object, so the engine refuses that one item instead of misreading the lines
/// after it.
fn ndjson_payload(items: &[BulkItem]) -> String {
    let mut payload = String::new();
    for item in items {
        payload.push_str(&item.directive.to_string());
        payload.push('\n');
        payload.push_str(&item.document.to_string());
        payload.push('\n');
    }
    payload
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::transport(format!("Elasticsearch request timed out: {}", e))
    } else if e.is_connect() {
        BackendError::transport(format!("Failed to connect to Elasticsearch: {}", e))
    } else {
        BackendError::transport(format!("Elasticsearch request failed: {}", e))
    }
}

fn status_error(status: StatusCode, body: JsonValue) -> BackendError {
    let reason = body
        .get("error")
        .and_then(|e| e.get("reason").and_then(JsonValue::as_str).or_else(|| e.as_str()))
        .map(str::to_string)
        .or_else(|| body.get("result").and_then(JsonValue::as_str).map(str::to_string))
        .unwrap_or_else(|| status.to_string());
    BackendError::new(
        status.as_u16(),
        body,
        format!("Elasticsearch returned {}: {}", status.as_u16(), reason),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let backend = ElasticBackend::new("http://localhost:9200", Duration::from_secs(5)).unwrap();
        assert_eq!(
            backend.endpoint(&["products", "_doc", "a b/c"]).as_str(),
            "http://localhost:9200/products/_doc/a%20b%2Fc"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let backend =
            ElasticBackend::new("http://es.internal:9200/cluster-a/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            backend.endpoint(&["_bulk"]).as_str(),
            "http://es.internal:9200/cluster-a/_bulk"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ElasticBackend::new("localhost:9200", Duration::from_secs(5)).is_err());
        assert!(ElasticBackend::new("not a url", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_status_error_prefers_engine_reason() {
        let err = status_error(
            StatusCode::NOT_FOUND,
            json!({ "error": { "type": "index_not_found_exception", "reason": "no such index [products]" }, "status": 404 }),
        );
        assert_eq!(err.status, Some(404));
        assert!(err.message.contains("no such index"));

        let err = status_error(StatusCode::NOT_FOUND, json!({ "result": "not_found" }));
        assert!(err.message.contains("not_found"));
    }

    #[test]
    fn test_ndjson_payload_keeps_lines_paired() {
        let items = vec![
            BulkItem::index("products", json!({ "code": "A" })),
            BulkItem::index("products", JsonValue::Null),
            BulkItem::index("products", json!("not a document")),
            BulkItem::index("products", json!({ "code": "C" })),
        ];
        let payload = ndjson_payload(&items);
        let lines: Vec<&str> = payload.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(payload.ends_with('\n'));
        for pair in lines.chunks(2) {
            let action: JsonValue = serde_json::from_str(pair[0]).unwrap();
            assert_eq!(action["index"]["_index"], "products");
        }
        assert_eq!(lines[1], r#"{"code":"A"}"#);
        assert_eq!(lines[3], "null");
        assert_eq!(lines[5], r#""not a document""#);
        assert_eq!(lines[7], r#"{"code":"C"}"#);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let backend = ElasticBackend::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = backend.ping().await.unwrap_err();
        assert_eq!(err.status, None);
    }
}
