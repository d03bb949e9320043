//! DeepSeek provider implementation
//!
//! DeepSeek exposes an OpenAI-compatible chat completions API. Requests run in
//! JSON mode, and an empty completion is a fatal error.

use crate::http::HttpExecutor;
use crate::protocol::types::{chat_messages, GenerationRequest, InstructionStyle, Message, RawOutput};
use crate::providers::adapter::{AdapterSettings, ProviderCapabilities, ProviderType, TransportAdapter};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// DeepSeek chat adapter
pub struct DeepSeekAdapter {
    settings: AdapterSettings,
    capabilities: ProviderCapabilities,
    http: Arc<dyn HttpExecutor>,
}

impl DeepSeekAdapter {
    pub fn new(settings: AdapterSettings, http: Arc<dyn HttpExecutor>) -> Self {
        Self {
            settings,
            capabilities: ProviderCapabilities {
                kinds: ProviderType::DeepSeek.default_kinds(),
                supports_json_mode: true,
            },
            http,
        }
    }
}

#[async_trait]
impl TransportAdapter for DeepSeekAdapter {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn attempt(&self, request: &GenerationRequest) -> ProviderResult<RawOutput> {
        self.capabilities.ensure_supported(self.name(), request.kind())?;

        let messages = chat_messages(request, InstructionStyle::JsonMode);
        let body = serde_json::to_value(ChatCompletionRequest {
            model: &self.settings.model,
            messages: &messages,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        })?;

        let response = self
            .http
            .post_json(
                &self.settings.endpoint("/chat/completions"),
                &body,
                self.settings.bearer_options(),
            )
            .await?;

        let completion: ChatCompletionResponse = serde_json::from_value(response)?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ProviderError::empty(self.name()))?;

        Ok(RawOutput::Text(content))
    }
}
