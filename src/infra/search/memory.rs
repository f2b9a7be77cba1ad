//! In-process index engine.
//!
//! Speaks the same JSON request and response shapes as the Elasticsearch
//! backend for the subset of the query DSL the gateway emits: `match_all`,
//! `multi_match` with `AUTO` fuzziness, `sort`, `size`, scroll cursors and
//! `index` bulk actions. Used by the test-suite and for running the gateway
//! without a cluster (`GATEWAY_BACKEND=memory`).

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Map, Value as JsonValue};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tokio::sync::RwLock;

use super::fuzzy::{fuzzy_match, tokenize};
use super::{parse_ttl, BackendError, BackendResult, BulkItem, SearchBackend};

const DEFAULT_SIZE: usize = 10;

#[derive(Debug, Clone)]
struct StoredDoc {
    source: JsonValue,
    version: u64,
    seq_no: u64,
}

#[derive(Debug)]
struct ScrollContext {
    hits: Vec<JsonValue>,
    position: usize,
    page_size: usize,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Store {
    indices: HashMap<String, BTreeMap<String, StoredDoc>>,
    scrolls: HashMap<String, ScrollContext>,
    seq_no: u64,
}

impl Store {
    fn next_seq_no(&mut self) -> u64 {
        self.seq_no += 1;
        self.seq_no
    }

    fn purge_expired_scrolls(&mut self, now: Instant) {
        self.scrolls.retain(|_, ctx| ctx.expires_at > now);
    }

    fn index_doc(&mut self, index: &str, id: Option<&str>, source: JsonValue) -> JsonValue {
        let seq_no = self.next_seq_no();
        let id = id.map(str::to_string).unwrap_or_else(generate_id);
        let docs = self.indices.entry(index.to_string()).or_default();
        let (version, result) = match docs.get(&id) {
            Some(existing) => (existing.version + 1, "updated"),
            None => (1, "created"),
        };
        docs.insert(
            id.clone(),
            StoredDoc {
                source,
                version,
                seq_no,
            },
        );
        write_ack(index, &id, version, seq_no, result)
    }

    fn update_doc(&mut self, index: &str, id: &str, partial: &JsonValue) -> BackendResult<JsonValue> {
        let Some(partial) = partial.as_object() else {
            return Err(mapper_parsing_error("partial document must be an object"));
        };
        let seq_no = self.next_seq_no();
        let docs = self
            .indices
            .get_mut(index)
            .ok_or_else(|| index_not_found(index))?;
        let doc = docs.get_mut(id).ok_or_else(|| document_missing(index, id))?;

        let mut merged = doc.source.clone();
        merge_object(&mut merged, partial);
        if merged == doc.source {
            return Ok(write_ack(index, id, doc.version, doc.seq_no, "noop"));
        }
        doc.source = merged;
        doc.version += 1;
        doc.seq_no = seq_no;
        Ok(write_ack(index, id, doc.version, seq_no, "updated"))
    }

    fn delete_doc(&mut self, index: &str, id: &str) -> BackendResult<JsonValue> {
        let seq_no = self.next_seq_no();
        let docs = self
            .indices
            .get_mut(index)
            .ok_or_else(|| index_not_found(index))?;
        match docs.remove(id) {
            Some(doc) => Ok(write_ack(index, id, doc.version + 1, seq_no, "deleted")),
            None => {
                let body = write_ack(index, id, 1, seq_no, "not_found");
                Err(BackendError::new(
                    404,
                    body,
                    format!("document [{}] not found in index [{}]", id, index),
                ))
            }
        }
    }
}

/// In-memory [`SearchBackend`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: RwLock<Store>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty index so reads against it succeed before the first write.
    pub async fn create_index(&self, index: &str) {
        let mut store = self.store.write().await;
        store.indices.entry(index.to_string()).or_default();
    }

    pub async fn document_count(&self, index: &str) -> usize {
        let store = self.store.read().await;
        store.indices.get(index).map(|d| d.len()).unwrap_or(0)
    }

    pub async fn open_scrolls(&self) -> usize {
        let store = self.store.read().await;
        store.scrolls.len()
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn get(&self, index: &str, id: &str) -> BackendResult<JsonValue> {
        let store = self.store.read().await;
        let docs = store.indices.get(index).ok_or_else(|| index_not_found(index))?;
        Ok(match docs.get(id) {
            Some(doc) => json!({
                "_index": index,
                "_id": id,
                "_version": doc.version,
                "_seq_no": doc.seq_no,
                "_primary_term": 1,
                "found": true,
                "_source": doc.source,
            }),
            None => json!({ "_index": index, "_id": id, "found": false }),
        })
    }

    async fn search(
        &self,
        index: &str,
        body: &JsonValue,
        scroll: Option<&str>,
    ) -> BackendResult<JsonValue> {
        let ttl = match scroll {
            Some(s) => Some(parse_ttl(s).ok_or_else(|| bad_ttl(s))?),
            None => None,
        };
        let size = body
            .get("size")
            .and_then(JsonValue::as_u64)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_SIZE);

        let mut store = self.store.write().await;
        let now = Instant::now();
        store.purge_expired_scrolls(now);

        let docs = store.indices.get(index).ok_or_else(|| index_not_found(index))?;
        let query = body.get("query").cloned().unwrap_or(json!({ "match_all": {} }));
        let sort = body.get("sort").cloned();

        let mut scored: Vec<(String, f64, &StoredDoc)> = Vec::new();
        for (id, doc) in docs {
            if let Some(score) = score_document(&query, &doc.source)? {
                scored.push((id.clone(), score, doc));
            }
        }
        let sort_keys = parse_sort(sort.as_ref())?;
        scored.sort_by(|a, b| compare_hits(&sort_keys, (&a.0, a.1, a.2), (&b.0, b.1, b.2)));

        let total = scored.len();
        let hits: Vec<JsonValue> = scored
            .iter()
            .map(|(id, score, doc)| {
                // Sorted hits carry their sort values instead of a score.
                let score = if sort_keys.is_empty() { json!(score) } else { JsonValue::Null };
                let mut hit = json!({
                    "_index": index,
                    "_id": id,
                    "_score": score,
                    "_source": doc.source,
                });
                if !sort_keys.is_empty() {
                    hit["sort"] = JsonValue::Array(
                        sort_keys
                            .iter()
                            .map(|k| lookup_path(&doc.source, &k.field).cloned().unwrap_or(JsonValue::Null))
                            .collect(),
                    );
                }
                hit
            })
            .collect();

        match ttl {
            Some(ttl) => {
                let first: Vec<JsonValue> = hits.iter().take(size).cloned().collect();
                let scroll_id = generate_scroll_id();
                store.scrolls.insert(
                    scroll_id.clone(),
                    ScrollContext {
                        hits,
                        position: first.len(),
                        page_size: size,
                        expires_at: now + ttl,
                    },
                );
                let mut resp = search_response(total, first);
                resp["_scroll_id"] = json!(scroll_id);
                Ok(resp)
            }
            None => {
                let page: Vec<JsonValue> = hits.into_iter().take(size).collect();
                Ok(search_response(total, page))
            }
        }
    }

    async fn scroll(&self, cursor: &str, ttl: &str) -> BackendResult<JsonValue> {
        let ttl = parse_ttl(ttl).ok_or_else(|| bad_ttl(ttl))?;
        let mut store = self.store.write().await;
        let now = Instant::now();
        store.purge_expired_scrolls(now);

        let ctx = store.scrolls.get_mut(cursor).ok_or_else(|| {
            BackendError::new(
                404,
                json!({
                    "error": {
                        "root_cause": [{
                            "type": "search_context_missing_exception",
                            "reason": format!("No search context found for id [{}]", cursor)
                        }],
                        "type": "search_phase_execution_exception",
                        "reason": "all shards failed"
                    },
                    "status": 404
                }),
                "search context missing or expired",
            )
        })?;

        let end = (ctx.position + ctx.page_size).min(ctx.hits.len());
        let page = ctx.hits[ctx.position..end].to_vec();
        ctx.position = end;
        ctx.expires_at = now + ttl;
        let total = ctx.hits.len();

        let mut resp = search_response(total, page);
        resp["_scroll_id"] = json!(cursor);
        Ok(resp)
    }

    async fn index(&self, index: &str, document: &JsonValue) -> BackendResult<JsonValue> {
        if !document.is_object() {
            return Err(mapper_parsing_error("document must be an object"));
        }
        let mut store = self.store.write().await;
        Ok(store.index_doc(index, None, document.clone()))
    }

    async fn bulk(&self, items: &[BulkItem]) -> BackendResult<JsonValue> {
        let mut store = self.store.write().await;
        let mut results = Vec::with_capacity(items.len());
        let mut errors = false;

        for item in items {
            let (op, meta) = match item.directive.as_object().and_then(|o| o.iter().next()) {
                Some((op, meta)) => (op.as_str(), meta),
                None => {
                    return Err(BackendError::new(
                        400,
                        json!({
                            "error": {
                                "type": "illegal_argument_exception",
                                "reason": "Malformed action/metadata line"
                            },
                            "status": 400
                        }),
                        "malformed bulk action line",
                    ))
                }
            };
            let index = meta.get("_index").and_then(JsonValue::as_str);
            let id = meta.get("_id").and_then(JsonValue::as_str);

            let outcome = match (op, index) {
                (_, None) => Err(item_error(400, "action_request_validation_exception", "index is missing")),
                ("index", Some(index)) => {
                    if item.document.is_object() {
                        let ack = store.index_doc(index, id, item.document.clone());
                        let status = status_for(&ack);
                        Ok((ack, status))
                    } else {
                        Err(item_error(
                            400,
                            "mapper_parsing_exception",
                            "failed to parse, document is empty or not an object",
                        ))
                    }
                }
                (other, Some(_)) => Err(item_error(
                    400,
                    "illegal_argument_exception",
                    &format!("Unsupported action [{}]", other),
                )),
            };

            let entry = match outcome {
                Ok((mut ack, status)) => {
                    ack["status"] = json!(status);
                    ack
                }
                Err((status, error)) => {
                    errors = true;
                    let mut entry = json!({ "status": status, "error": error });
                    if let Some(index) = index {
                        entry["_index"] = json!(index);
                    }
                    if let Some(id) = id {
                        entry["_id"] = json!(id);
                    }
                    entry
                }
            };
            let mut wrapped = Map::new();
            wrapped.insert(op.to_string(), entry);
            results.push(JsonValue::Object(wrapped));
        }

        Ok(json!({ "took": 0, "errors": errors, "items": results }))
    }

    async fn update(
        &self,
        index: &str,
        id: &str,
        partial: &JsonValue,
    ) -> BackendResult<JsonValue> {
        let mut store = self.store.write().await;
        store.update_doc(index, id, partial)
    }

    async fn delete(&self, index: &str, id: &str) -> BackendResult<JsonValue> {
        let mut store = self.store.write().await;
        store.delete_doc(index, id)
    }

    async fn ping(&self) -> BackendResult<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct SortKey {
    field: String,
    descending: bool,
}

fn parse_sort(sort: Option<&JsonValue>) -> BackendResult<Vec<SortKey>> {
    let Some(sort) = sort else {
        return Ok(Vec::new());
    };
    let entries = match sort {
        JsonValue::Array(arr) => arr.clone(),
        other => vec![other.clone()],
    };
    let mut keys = Vec::new();
    for entry in entries {
        let (field, order) = match &entry {
            JsonValue::String(field) => (field.clone(), "asc".to_string()),
            JsonValue::Object(obj) if obj.len() == 1 => {
                let (field, spec) = obj.iter().next().map(|(k, v)| (k.clone(), v.clone())).unwrap_or_default();
                let order = spec
                    .as_str()
                    .or_else(|| spec.get("order").and_then(JsonValue::as_str))
                    .unwrap_or("asc")
                    .to_string();
                (field, order)
            }
            _ => return Err(parsing_error("malformed sort clause")),
        };
        // `field.keyword` sorts on the raw value of `field`.
        let field = field.strip_suffix(".keyword").unwrap_or(&field).to_string();
        keys.push(SortKey {
            field,
            descending: order == "desc",
        });
    }
    Ok(keys)
}

fn compare_hits(
    keys: &[SortKey],
    a: (&String, f64, &StoredDoc),
    b: (&String, f64, &StoredDoc),
) -> Ordering {
    if keys.is_empty() {
        return b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(b.0));
    }
    for key in keys {
        let va = lookup_path(&a.2.source, &key.field);
        let vb = lookup_path(&b.2.source, &key.field);
        let ord = match (va, vb) {
            // Missing values sort last regardless of direction.
            (None, None) => Ordering::Equal,
            (None, Some(_)) => return Ordering::Greater,
            (Some(_), None) => return Ordering::Less,
            (Some(x), Some(y)) => compare_values(x, y),
        };
        let ord = if key.descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.0.cmp(b.0)
}

fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Score of `source` for `query`, `None` when it does not match.
fn score_document(query: &JsonValue, source: &JsonValue) -> BackendResult<Option<f64>> {
    let Some((kind, clause)) = query.as_object().and_then(|o| o.iter().next()) else {
        return Err(parsing_error("query must be an object with a single clause"));
    };
    match kind.as_str() {
        "match_all" => Ok(Some(1.0)),
        "multi_match" => {
            let text = clause
                .get("query")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| parsing_error("[multi_match] requires query value"))?;
            let fields: Vec<&str> = clause
                .get("fields")
                .and_then(JsonValue::as_array)
                .map(|a| a.iter().filter_map(JsonValue::as_str).collect())
                .unwrap_or_default();
            let fuzzy = clause.get("fuzziness").is_some();

            let mut doc_tokens = Vec::new();
            for field in &fields {
                if let Some(value) = lookup_path(source, field) {
                    collect_tokens(value, &mut doc_tokens);
                }
            }

            let mut score = 0.0;
            for term in tokenize(text) {
                let best = doc_tokens
                    .iter()
                    .filter_map(|token| {
                        if *token == term {
                            Some(1.0)
                        } else if fuzzy && fuzzy_match(&term, token) {
                            Some(0.5)
                        } else {
                            None
                        }
                    })
                    .fold(0.0_f64, f64::max);
                score += best;
            }
            Ok(if score > 0.0 { Some(score) } else { None })
        }
        other => Err(parsing_error(&format!("unknown query [{}]", other))),
    }
}

fn collect_tokens(value: &JsonValue, out: &mut Vec<String>) {
    match value {
        JsonValue::String(s) => out.extend(tokenize(s)),
        JsonValue::Array(arr) => arr.iter().for_each(|v| collect_tokens(v, out)),
        JsonValue::Number(n) => out.push(n.to_string()),
        _ => {}
    }
}

fn lookup_path<'a>(source: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.')
        .try_fold(source, |value, segment| value.get(segment))
        .filter(|v| !v.is_null())
}

fn merge_object(target: &mut JsonValue, partial: &Map<String, JsonValue>) {
    let Some(target) = target.as_object_mut() else {
        return;
    };
    for (key, value) in partial {
        if let (Some(existing), JsonValue::Object(inner)) = (target.get_mut(key), value) {
            if existing.is_object() {
                merge_object(existing, inner);
                continue;
            }
        }
        target.insert(key.clone(), value.clone());
    }
}

fn search_response(total: usize, hits: Vec<JsonValue>) -> JsonValue {
    let max_score = hits
        .iter()
        .filter_map(|h| h.get("_score").and_then(JsonValue::as_f64))
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));
    json!({
        "took": 0,
        "timed_out": false,
        "hits": {
            "total": { "value": total, "relation": "eq" },
            "max_score": max_score,
            "hits": hits,
        }
    })
}

fn write_ack(index: &str, id: &str, version: u64, seq_no: u64, result: &str) -> JsonValue {
    json!({
        "_index": index,
        "_id": id,
        "_version": version,
        "result": result,
        "_shards": { "total": 1, "successful": 1, "failed": 0 },
        "_seq_no": seq_no,
        "_primary_term": 1,
    })
}

fn status_for(ack: &JsonValue) -> u16 {
    if ack.get("result").and_then(JsonValue::as_str) == Some("created") {
        201
    } else {
        200
    }
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

fn generate_scroll_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

fn item_error(status: u16, kind: &str, reason: &str) -> (u16, JsonValue) {
    (status, json!({ "type": kind, "reason": reason }))
}

fn error_body(status: u16, kind: &str, reason: &str) -> JsonValue {
    json!({
        "error": { "root_cause": [{ "type": kind, "reason": reason }], "type": kind, "reason": reason },
        "status": status
    })
}

fn index_not_found(index: &str) -> BackendError {
    let reason = format!("no such index [{}]", index);
    BackendError::new(404, error_body(404, "index_not_found_exception", &reason), reason)
}

fn document_missing(index: &str, id: &str) -> BackendError {
    let reason = format!("[{}]: document missing", id);
    let mut body = error_body(404, "document_missing_exception", &reason);
    body["error"]["index"] = json!(index);
    BackendError::new(404, body, reason)
}

fn mapper_parsing_error(reason: &str) -> BackendError {
    BackendError::new(400, error_body(400, "mapper_parsing_exception", reason), reason)
}

fn parsing_error(reason: &str) -> BackendError {
    BackendError::new(400, error_body(400, "parsing_exception", reason), reason)
}

fn bad_ttl(ttl: &str) -> BackendError {
    let reason = format!("failed to parse setting [scroll] with value [{}]", ttl);
    BackendError::new(400, error_body(400, "illegal_argument_exception", &reason), reason)
}
