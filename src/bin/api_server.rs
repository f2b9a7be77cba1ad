// src/bin/api_server.rs

use product_gateway::infra::config::{self, BackendKind};
use product_gateway::infra::logging;
use product_gateway::transport;
use product_gateway::{ElasticBackend, MemoryBackend, ProductService, ProductValidator, SearchBackend};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init(config::json_logs());

    // --- Validator Initialization ---
    // Both schema variants are built once and shared read-only by every request.
    let validator = Arc::new(ProductValidator::new());

    // --- Backend Initialization ---
    let index = config::products_index();
    let backend: Arc<dyn SearchBackend> = match config::backend_kind()? {
        BackendKind::Elasticsearch => {
            let url = config::elasticsearch_url();
            let backend = ElasticBackend::new(&url, config::elasticsearch_timeout()?)?;
            if let Err(e) = backend.ping().await {
                warn!(elasticsearch_url = %url, error = %e, "Elasticsearch not reachable at startup (continuing)");
            }
            info!(elasticsearch_url = %url, "Using Elasticsearch backend");
            Arc::new(backend)
        }
        BackendKind::Memory => {
            let backend = MemoryBackend::new();
            backend.create_index(&index).await;
            info!("Using in-memory backend (documents are lost on restart)");
            Arc::new(backend)
        }
    };

    let write_validation = config::write_validation()?;
    info!(index = %index, ?write_validation, "Product service initialized");
    let app_state = transport::http::AppState {
        product_service: Arc::new(ProductService::new(backend, validator, index, write_validation)),
    };

    // --- API Server Initialization ---
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);

    let addr = format!("0.0.0.0:{}", config::port()?);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("The server is listening on http://{}", addr);
    info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received (Ctrl+C)");
        })
        .await?;

    Ok(())
}
