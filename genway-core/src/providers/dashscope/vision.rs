use super::types::{
    ChatOutput, ContentPart, MultimodalInput, MultimodalMessage, MultimodalParameters,
    MultimodalRequest,
};
use super::{decode_output, first_choice};
use crate::http::HttpExecutor;
use crate::protocol::types::{GenerationRequest, InstructionStyle, RawOutput};
use crate::providers::adapter::{AdapterSettings, ProviderCapabilities, ProviderType, TransportAdapter};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use std::sync::Arc;

const MULTIMODAL_PATH: &str = "/api/v1/services/aigc/multimodal-generation/generation";

/// Qwen-VL image-to-data extraction through the DashScope multimodal API
pub struct QwenVlAdapter {
    settings: AdapterSettings,
    capabilities: ProviderCapabilities,
    http: Arc<dyn HttpExecutor>,
}

impl QwenVlAdapter {
    pub fn new(settings: AdapterSettings, http: Arc<dyn HttpExecutor>) -> Self {
        Self {
            settings,
            capabilities: ProviderCapabilities::serving(ProviderType::QwenVl.default_kinds()),
            http,
        }
    }

    fn build_request(&self, request: &GenerationRequest) -> ProviderResult<MultimodalRequest<'_>> {
        let image = request
            .image_input()
            .filter(|image| !image.is_empty())
            .ok_or_else(|| ProviderError::InvalidRequest {
                message: "vision extraction requires an image".to_string(),
            })?;

        let mut messages = Vec::with_capacity(2);
        if let Some(instruction) = request.schema_instruction(InstructionStyle::Lenient) {
            messages.push(MultimodalMessage {
                role: "system",
                content: vec![ContentPart::text(instruction)],
            });
        }
        messages.push(MultimodalMessage {
            role: "user",
            content: vec![
                ContentPart::image(image.to_model_reference()),
                ContentPart::text(request.prompt().as_text()),
            ],
        });

        Ok(MultimodalRequest {
            model: &self.settings.model,
            input: MultimodalInput { messages },
            parameters: MultimodalParameters {
                result_format: "message",
            },
        })
    }
}

#[async_trait]
impl TransportAdapter for QwenVlAdapter {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn attempt(&self, request: &GenerationRequest) -> ProviderResult<RawOutput> {
        self.capabilities.ensure_supported(self.name(), request.kind())?;

        let body = serde_json::to_value(self.build_request(request)?)?;
        let response = self
            .http
            .post_json(
                &self.settings.endpoint(MULTIMODAL_PATH),
                &body,
                self.settings.bearer_options(),
            )
            .await?;

        let output: ChatOutput<Vec<ContentPart>> = decode_output(response, self.name())?;
        let text = first_choice(output, self.name())?
            .into_iter()
            .find_map(|part| part.text)
            .ok_or_else(|| ProviderError::empty(self.name()))?;

        Ok(RawOutput::Text(text))
    }
}
