//! Provider chain demo
//!
//! Builds a gateway from a YAML file (first argument) or from the
//! environment, then runs one request of each generation kind and prints
//! which provider answered.
//!
//! Run with: RUST_LOG=genway_core=info cargo run --example chain_demo -- gateway.yaml

use anyhow::Context;
use genway_core::{load_from_yaml, ChainResult, Gateway, GatewayConfig, ImageInput};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_from_yaml(&path).with_context(|| format!("loading {}", path))?,
        None => GatewayConfig::from_env(),
    };
    let gateway = Gateway::from_config(&config).context("building gateway")?;
    let cancel = CancellationToken::new();

    println!("\n📝 Structured JSON");
    report(
        gateway
            .generate_json(
                "Suggest three names for a neighbourhood bakery",
                json!({"type": "object", "properties": {"names": {"type": "array", "items": {"type": "string"}}}}),
                &cancel,
            )
            .await,
    );

    println!("\n🎨 Image");
    report(
        gateway
            .generate_image("A watercolour of a bakery storefront at sunrise", &cancel)
            .await,
    );

    println!("\n🔍 Vision extraction");
    report(
        gateway
            .extract_from_image(
                ImageInput::url("https://upload.wikimedia.org/wikipedia/commons/3/3f/Fronalpstock_big.jpg"),
                "Describe the landscape",
                Some(json!({"type": "object", "properties": {"description": {"type": "string"}}})),
                &cancel,
            )
            .await,
    );

    Ok(())
}

fn report(result: ChainResult) {
    match result {
        Ok(result) => {
            println!("  ✅ provider: {} (fallback: {})", result.provider_used, result.used_fallback);
            println!("  attempts: {}", result.attempts);
            for failure in &result.provider_errors {
                println!("  ⚠️ {} failed after {} attempt(s): {}", failure.provider, failure.attempts, failure.error);
            }
            match result.output.as_json() {
                Some(value) => println!("  output: {}", value),
                None => {
                    let reference = result.output.image_url().unwrap_or_default();
                    let shown: String = reference.chars().take(96).collect();
                    println!("  image: {}", shown);
                }
            }
        }
        Err(err) => {
            println!("  ❌ {}", err.summary());
            for failure in err.failures() {
                println!("    - {} after {} attempt(s): {}", failure.provider, failure.attempts, failure.error);
            }
        }
    }
}
