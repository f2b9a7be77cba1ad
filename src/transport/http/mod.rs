pub mod router;
pub mod types;
pub mod handlers {
    pub mod bulk;
    pub mod common;
    pub mod health;
    pub mod listing;
    pub mod products;
    pub mod search;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
