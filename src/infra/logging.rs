//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "product_gateway=info,api_server=info,preflight=info,tower_http=info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter;
/// `json` switches to one JSON object per line.
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    // Ignore the error when a subscriber is already installed (tests).
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
