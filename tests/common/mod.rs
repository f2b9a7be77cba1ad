//! Shared harness: runs the gateway router in-process on an ephemeral port.

#![allow(dead_code)]

use product_gateway::{transport, MemoryBackend, ProductService, ProductValidator, SearchBackend, WriteValidation};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const INDEX: &str = "products";

pub struct TestGateway {
    pub base_url: String,
    pub client: reqwest::Client,
    pub backend: Arc<MemoryBackend>,
    server_handle: JoinHandle<()>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub async fn spawn_gateway(policy: WriteValidation) -> Result<TestGateway, Box<dyn std::error::Error>> {
    let backend = Arc::new(MemoryBackend::new());
    backend.create_index(INDEX).await;
    let (base_url, server_handle) = serve(backend.clone(), policy).await?;
    Ok(TestGateway {
        base_url,
        client: reqwest::Client::new(),
        backend,
        server_handle,
    })
}

/// Serves a router over any backend; returns the base URL and the server task.
pub async fn serve(
    backend: Arc<dyn SearchBackend>,
    policy: WriteValidation,
) -> Result<(String, JoinHandle<()>), Box<dyn std::error::Error>> {
    let service = ProductService::new(backend, Arc::new(ProductValidator::new()), INDEX, policy);
    let app_state = transport::http::AppState {
        product_service: Arc::new(service),
    };
    let router = transport::http::create_router(app_state);

    // Bind to an ephemeral port to avoid conflicts with a running gateway.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Ok((format!("http://127.0.0.1:{}", port), handle))
}

pub fn product(code: &str) -> JsonValue {
    json!({
        "title": format!("Product {}", code),
        "code": code,
        "description": "A test product",
        "reviewScore": 4,
        "imageUrl": "https://img.example.com/p.png",
        "tags": ["test"]
    })
}
