use super::types::{ChatOutput, TextGenerationRequest, TextInput, TextParameters};
use super::{decode_output, first_choice};
use crate::http::HttpExecutor;
use crate::protocol::types::{chat_messages, GenerationRequest, InstructionStyle, RawOutput};
use crate::providers::adapter::{AdapterSettings, ProviderCapabilities, ProviderType, TransportAdapter};
use crate::providers::error::ProviderResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const TEXT_GENERATION_PATH: &str = "/api/v1/services/aigc/text-generation/generation";

/// Qwen text generation through the DashScope native API
pub struct QwenTextAdapter {
    settings: AdapterSettings,
    capabilities: ProviderCapabilities,
    http: Arc<dyn HttpExecutor>,
}

impl QwenTextAdapter {
    pub fn new(settings: AdapterSettings, http: Arc<dyn HttpExecutor>) -> Self {
        Self {
            settings,
            capabilities: ProviderCapabilities::serving(ProviderType::Qwen.default_kinds()),
            http,
        }
    }
}

#[async_trait]
impl TransportAdapter for QwenTextAdapter {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn attempt(&self, request: &GenerationRequest) -> ProviderResult<RawOutput> {
        self.capabilities.ensure_supported(self.name(), request.kind())?;

        let messages = chat_messages(request, InstructionStyle::Lenient);
        let body = serde_json::to_value(TextGenerationRequest {
            model: &self.settings.model,
            input: TextInput { messages: &messages },
            parameters: TextParameters {
                result_format: "message",
                enable_search: true,
            },
        })?;

        let response = self
            .http
            .post_json(
                &self.settings.endpoint(TEXT_GENERATION_PATH),
                &body,
                self.settings.bearer_options(),
            )
            .await?;

        let output: ChatOutput<String> = decode_output(response, self.name())?;
        let content = first_choice(output, self.name())?;
        debug!(provider = self.name(), chars = content.len(), "received text output");

        Ok(RawOutput::Text(content))
    }
}
