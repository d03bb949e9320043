//! Provider abstraction and chain orchestration
//!
//! This module implements the transport adapters for each concrete provider,
//! the retry controller that wraps them, the normalizer that turns raw output
//! into caller-facing values, and the chain that tries providers in order.

pub mod adapter;
pub mod dashscope;
pub mod deepseek;
pub mod error;
pub mod gemini;
pub mod normalize;
pub mod retry;
pub mod routing;

pub use adapter::{
    AdapterSettings, PollSettings, ProviderCapabilities, ProviderType, TransportAdapter,
};
pub use error::{ErrorMapper, ProviderError, ProviderResult, TransientKind};
pub use retry::{AttemptRecord, RetryExecutor, RetryPolicy, RetryResult};
pub use routing::{
    ChainBuilder, ChainError, ChainLink, ChainResult, ProviderChain, ProviderFailure, RoutingResult,
};

// Re-export concrete adapters
pub use dashscope::{QwenTextAdapter, QwenVlAdapter, WanxImageAdapter};
pub use deepseek::DeepSeekAdapter;
pub use gemini::GeminiImageAdapter;
