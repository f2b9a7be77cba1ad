pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::product_service::ProductService;
pub use domain::schema::{ProductValidator, SchemaVariant, ValidationResult};
pub use error::{GatewayError, GatewayResult};
pub use infra::config::WriteValidation;
pub use infra::search::{ElasticBackend, MemoryBackend, SearchBackend};
