use product_gateway::infra::config;
use product_gateway::{ElasticBackend, SearchBackend};
use serde_json::json;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--create-index-if-missing]\n\
         \n\
         Reads env vars:\n\
           ELASTICSEARCH_URL, PRODUCTS_INDEX, ELASTICSEARCH_TIMEOUT_SECS\n"
    );
    std::process::exit(2);
}

/// Mapping for a fresh products index. Listing sorts on `code.keyword`, so
/// `code` needs its keyword subfield.
fn products_mapping() -> serde_json::Value {
    json!({
        "mappings": {
            "properties": {
                "code": {
                    "type": "text",
                    "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
                },
                "title": { "type": "text" },
                "tags": { "type": "text" },
                "specifications": {
                    "properties": {
                        "brand": { "type": "text" }
                    }
                }
            }
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    let create_index_if_missing = args.iter().any(|a| a == "--create-index-if-missing");

    // Force-read config (nice error messages if malformed)
    let url = config::elasticsearch_url();
    let index = config::products_index();
    let timeout = config::elasticsearch_timeout()?;
    let write_validation = config::write_validation()?;

    println!("> Preflight:");
    println!("  ELASTICSEARCH_URL={}", url);
    println!("  PRODUCTS_INDEX={}", index);
    println!("  ELASTICSEARCH_TIMEOUT_SECS={}", timeout.as_secs());
    println!("  GATEWAY_WRITE_VALIDATION={:?}", write_validation);

    let backend = ElasticBackend::new(&url, timeout)?;

    // Basic connectivity
    backend
        .ping()
        .await
        .map_err(|e| anyhow::anyhow!("Elasticsearch not reachable at {}: {}", url, e))?;
    println!("  Cluster reachable.");

    // Index existence
    if backend.index_exists(&index).await? {
        println!("  Index '{}' exists.", index);
    } else if create_index_if_missing {
        println!("  Index '{}' missing; creating it...", index);
        let ack = backend.create_index(&index, &products_mapping()).await?;
        println!("  Created: {}", ack);
    } else {
        eprintln!(
            "  Index '{}' is missing. Re-run with --create-index-if-missing to create it.",
            index
        );
        std::process::exit(1);
    }

    println!("> Preflight OK");
    Ok(())
}
