//! DashScope API types
//!
//! These types match the DashScope native API format and are used for
//! serialization/deserialization when talking to its text, multimodal and
//! image-synthesis services.

use crate::protocol::types::Message;
use serde::{Deserialize, Serialize};

/// Text generation request (`/services/aigc/text-generation/generation`)
#[derive(Debug, Serialize)]
pub struct TextGenerationRequest<'a> {
    pub model: &'a str,
    pub input: TextInput<'a>,
    pub parameters: TextParameters,
}

#[derive(Debug, Serialize)]
pub struct TextInput<'a> {
    pub messages: &'a [Message],
}

#[derive(Debug, Serialize)]
pub struct TextParameters {
    pub result_format: &'static str,
    pub enable_search: bool,
}

/// Multimodal generation request (`/services/aigc/multimodal-generation/generation`)
#[derive(Debug, Serialize)]
pub struct MultimodalRequest<'a> {
    pub model: &'a str,
    pub input: MultimodalInput,
    pub parameters: MultimodalParameters,
}

#[derive(Debug, Serialize)]
pub struct MultimodalInput {
    pub messages: Vec<MultimodalMessage>,
}

#[derive(Debug, Serialize)]
pub struct MultimodalMessage {
    pub role: &'static str,
    pub content: Vec<ContentPart>,
}

/// One part of a multimodal message: exactly one field is set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn image(reference: impl Into<String>) -> Self {
        Self {
            image: Some(reference.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MultimodalParameters {
    pub result_format: &'static str,
}

/// Image synthesis submission (`/services/aigc/text2image/image-synthesis`)
#[derive(Debug, Serialize)]
pub struct ImageSynthesisRequest<'a> {
    pub model: &'a str,
    pub input: ImageSynthesisInput,
    pub parameters: ImageSynthesisParameters,
}

#[derive(Debug, Serialize)]
pub struct ImageSynthesisInput {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ImageSynthesisParameters {
    pub n: u32,
    pub size: &'static str,
    pub prompt_extend: bool,
    pub watermark: bool,
    pub seed: u64,
}

impl Default for ImageSynthesisParameters {
    fn default() -> Self {
        Self {
            n: 1,
            size: "1280*1280",
            prompt_extend: true,
            watermark: false,
            seed: 12345,
        }
    }
}

/// Response envelope shared by every DashScope endpoint
#[derive(Debug, Deserialize)]
pub struct DashScopeResponse<O> {
    pub output: Option<O>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub request_id: Option<String>,
}

/// `output` of text and multimodal generation (`result_format: message`)
#[derive(Debug, Deserialize)]
pub struct ChatOutput<C> {
    #[serde(default = "Vec::new")]
    pub choices: Vec<ChatChoice<C>>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice<C> {
    pub message: ChoiceMessage<C>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage<C> {
    pub content: Option<C>,
}

/// `output` of image synthesis submissions and task queries
#[derive(Debug, Deserialize)]
pub struct TaskOutput {
    #[serde(default)]
    pub task_id: Option<String>,

    #[serde(default)]
    pub task_status: Option<TaskStatus>,

    #[serde(default)]
    pub results: Vec<TaskResult>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}
