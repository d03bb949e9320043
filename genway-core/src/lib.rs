//! Genway Core Library
//!
//! A resilient generation gateway: structured prompts go in, JSON or image
//! references come out. Each generation kind is served by an ordered chain of
//! providers; every provider runs under its own retry policy and the first
//! usable output wins.
//!
//! ```no_run
//! use genway_core::{Gateway, GatewayConfig};
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Gateway::from_config(&GatewayConfig::from_env())?;
//! let result = gateway
//!     .generate_json("Summarize Q3 sales", json!({"type": "object"}), &CancellationToken::new())
//!     .await?;
//! println!("{} answered: {:?}", result.provider_used, result.output);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod gateway;
pub mod http;
pub mod protocol;
pub mod providers;

pub use config::{load_from_json, load_from_yaml, ConfigError, GatewayConfig, ProviderConfig};
pub use gateway::Gateway;
pub use protocol::{GeneratedOutput, GenerationKind, GenerationRequest, ImageInput, Prompt};
pub use providers::{
    ChainError, ChainResult, ProviderChain, ProviderError, ProviderFailure, RetryPolicy,
    RoutingResult, TransportAdapter,
};

/// Returns the version of the Genway Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
