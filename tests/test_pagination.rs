//! Listing and scroll continuation over a catalogue larger than one page.

mod common;

use common::{product, spawn_gateway, INDEX};
use product_gateway::WriteValidation;
use serde_json::{json, Value as JsonValue};
use std::collections::HashSet;

fn codes(docs: &[JsonValue]) -> Vec<String> {
    docs.iter()
        .filter_map(|d| d["code"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_listing_walks_all_pages_in_code_order() -> Result<(), Box<dyn std::error::Error>> {
    let gw = spawn_gateway(WriteValidation::Strict).await?;

    // Submitted in reverse so ordering comes from the sort, not insertion.
    let docs: Vec<JsonValue> = (0..120).rev().map(|i| product(&format!("P{:04}", i))).collect();
    let resp = gw.client.post(gw.url("/products/bulk")).json(&docs).send().await?;
    assert_eq!(resp.status(), 200);
    let summary: JsonValue = resp.json().await?;
    assert_eq!(summary, json!({ "message": "Bulk indexing successful", "count": 120 }));
    assert_eq!(gw.backend.document_count(INDEX).await, 120);

    let first: JsonValue = gw.client.get(gw.url("/products")).send().await?.json().await?;
    assert_eq!(first["total"], 120);
    let scroll_id = first["scrollId"].as_str().unwrap().to_string();
    let page1 = codes(first["page"].as_array().unwrap());
    assert_eq!(page1.len(), 50);

    let mut seen: Vec<String> = page1;
    loop {
        let resp = gw
            .client
            .get(gw.url("/nextpage"))
            .query(&[("scrollId", scroll_id.as_str())])
            .send()
            .await?;
        assert_eq!(resp.status(), 200);
        let body: JsonValue = resp.json().await?;
        let hits: Vec<JsonValue> = body["hits"]["hits"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["_source"].clone())
            .collect();
        if hits.is_empty() {
            break;
        }
        assert!(hits.len() <= 50);
        seen.extend(codes(&hits));
    }

    assert_eq!(seen.len(), 120);
    let unique: HashSet<&String> = seen.iter().collect();
    assert_eq!(unique.len(), 120, "pages overlapped");
    let mut sorted = seen.clone();
    sorted.sort();
    assert_eq!(seen, sorted, "pages out of code order");
    assert_eq!(seen[0], "P0000");
    assert_eq!(seen[119], "P0119");
    Ok(())
}

#[tokio::test]
async fn test_listing_empty_catalogue() -> Result<(), Box<dyn std::error::Error>> {
    let gw = spawn_gateway(WriteValidation::Strict).await?;
    let first: JsonValue = gw.client.get(gw.url("/products")).send().await?.json().await?;
    assert_eq!(first["total"], 0);
    assert_eq!(first["page"], json!([]));
    Ok(())
}

#[tokio::test]
async fn test_nextpage_unknown_cursor_relays_404() -> Result<(), Box<dyn std::error::Error>> {
    let gw = spawn_gateway(WriteValidation::Strict).await?;

    let resp = gw
        .client
        .get(gw.url("/nextpage?scrollId=no-such-cursor"))
        .send()
        .await?;
    assert_eq!(resp.status(), 404);
    let body: JsonValue = resp.json().await?;
    assert_eq!(body["error"]["type"], "search_phase_execution_exception");

    // A missing cursor is forwarded as empty and fails the same way.
    let resp = gw.client.get(gw.url("/nextpage")).send().await?;
    assert_eq!(resp.status(), 404);
    Ok(())
}
