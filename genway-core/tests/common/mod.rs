//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use genway_core::protocol::{GenerationKind, GenerationRequest, RawOutput};
use genway_core::providers::{ProviderCapabilities, ProviderError, ProviderResult, TransportAdapter};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

type Responder = Box<dyn Fn(u32) -> ProviderResult<RawOutput> + Send + Sync>;

/// Adapter whose answers are scripted by call index (1-based)
pub struct MockAdapter {
    name: String,
    capabilities: ProviderCapabilities,
    respond: Responder,
    delay: Option<Duration>,
    calls: AtomicU32,
    call_times: Mutex<Vec<Instant>>,
}

impl MockAdapter {
    pub fn new(
        name: &str,
        kind: GenerationKind,
        respond: impl Fn(u32) -> ProviderResult<RawOutput> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            capabilities: ProviderCapabilities::serving(vec![kind]),
            respond: Box::new(respond),
            delay: None,
            calls: AtomicU32::new(0),
            call_times: Mutex::new(Vec::new()),
        })
    }

    /// Adapter that waits `delay` before every answer
    pub fn slow(name: &str, kind: GenerationKind, delay: Duration, output: RawOutput) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            capabilities: ProviderCapabilities::serving(vec![kind]),
            respond: Box::new(move |_| Ok(output.clone())),
            delay: Some(delay),
            calls: AtomicU32::new(0),
            call_times: Mutex::new(Vec::new()),
        })
    }

    /// Text adapter that always returns the same text
    pub fn text(name: &str, text: &str) -> Arc<Self> {
        let text = text.to_string();
        Self::new(name, GenerationKind::Json, move |_| Ok(RawOutput::Text(text.clone())))
    }

    /// Text adapter that always fails with the same error
    pub fn failing(name: &str, error: ProviderError) -> Arc<Self> {
        Self::new(name, GenerationKind::Json, move |_| Err(error.clone()))
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Instants at which each call started
    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn attempt(&self, _request: &GenerationRequest) -> ProviderResult<RawOutput> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.call_times.lock().unwrap().push(Instant::now());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)(call)
    }
}
