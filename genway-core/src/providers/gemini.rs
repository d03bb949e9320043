//! Gemini image generation
//!
//! Calls `models/{model}:generateContent` and returns the first inline image
//! part of the first candidate.

use crate::http::HttpExecutor;
use crate::protocol::types::{GenerationRequest, RawOutput};
use crate::providers::adapter::{AdapterSettings, ProviderCapabilities, ProviderType, TransportAdapter};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

/// Gemini image adapter
pub struct GeminiImageAdapter {
    settings: AdapterSettings,
    capabilities: ProviderCapabilities,
    http: Arc<dyn HttpExecutor>,
}

impl GeminiImageAdapter {
    pub fn new(settings: AdapterSettings, http: Arc<dyn HttpExecutor>) -> Self {
        Self {
            settings,
            capabilities: ProviderCapabilities::serving(ProviderType::Gemini.default_kinds()),
            http,
        }
    }
}

#[async_trait]
impl TransportAdapter for GeminiImageAdapter {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn attempt(&self, request: &GenerationRequest) -> ProviderResult<RawOutput> {
        self.capabilities.ensure_supported(self.name(), request.kind())?;

        let body = serde_json::to_value(GenerateContentRequest {
            contents: vec![Content {
                parts: vec![TextPart {
                    text: request.prompt().as_text(),
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["TEXT", "IMAGE"],
            },
        })?;

        let url = self.settings.endpoint(&format!(
            "/v1beta/models/{}:generateContent",
            self.settings.model
        ));
        let options = crate::http::RequestOptions::new()
            .with_timeout(self.settings.timeout)
            .with_header("x-goog-api-key", self.settings.api_key.expose_secret());

        let response = self.http.post_json(&url, &body, options).await?;
        let response: GenerateContentResponse = serde_json::from_value(response)?;

        let inline = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().find_map(|part| part.inline_data))
            .ok_or_else(|| ProviderError::empty(self.name()))?;

        let data = STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| ProviderError::parse(format!("invalid inline image data: {}", e)))?;

        Ok(RawOutput::InlineImage {
            mime_type: inline.mime_type,
            data,
        })
    }
}
