//! Core protocol types for generation requests
//!
//! This module contains the data structures that flow through the gateway:
//! - `GenerationRequest`: what the caller wants generated
//! - `RawOutput`: what a transport adapter got back from its provider
//! - `GeneratedOutput`: what the normalizer hands back to the caller
//!
//! Requests are immutable once built; every adapter only ever borrows them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of generation a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    /// Text completion whose output must be JSON
    Json,
    /// Text-to-image generation
    Image,
    /// Image-to-data extraction (output must be JSON)
    VisionExtract,
}

impl GenerationKind {
    /// Whether outputs of this kind are normalized as JSON
    pub fn expects_json(&self) -> bool {
        matches!(self, Self::Json | Self::VisionExtract)
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Image => write!(f, "image"),
            Self::VisionExtract => write!(f, "vision_extract"),
        }
    }
}

/// Prompt payload: free text or structured instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    /// Plain text prompt
    Text(String),
    /// Structured instructions, sent to the provider as serialized JSON
    Structured(Value),
}

impl Prompt {
    /// Render the prompt as the text a provider receives
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => value.to_string(),
        }
    }

    /// Check if the prompt carries no content
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Structured(Value::Null) => true,
            Self::Structured(_) => false,
        }
    }
}

impl From<String> for Prompt {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Prompt {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Value> for Prompt {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

/// Output-shape descriptor.
///
/// The schema only annotates the prompt; the gateway never validates provider
/// output against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputShape {
    schema: Value,
}

impl OutputShape {
    /// Wrap a JSON schema (or an example object) describing the expected output
    pub fn new(schema: Value) -> Self {
        Self { schema }
    }

    /// The wrapped schema
    pub fn schema(&self) -> &Value {
        &self.schema
    }
}

impl From<Value> for OutputShape {
    fn from(schema: Value) -> Self {
        Self::new(schema)
    }
}

/// How the schema instruction is phrased for a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionStyle {
    /// Providers that may wrap JSON in Markdown fences
    Lenient,
    /// Providers running in JSON mode; asked to skip fences entirely
    JsonMode,
}

/// Image handed to a vision extraction request
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageInput {
    /// Publicly reachable image URL
    Url { url: String },
    /// Base64 payload, with or without a `data:` prefix
    Base64 { data: String },
    /// Raw image bytes
    Bytes { mime_type: String, data: Vec<u8> },
}

impl ImageInput {
    /// Reference a remote image
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    /// Base64 image data; bare payloads are assumed to be JPEG
    pub fn base64(data: impl Into<String>) -> Self {
        Self::Base64 { data: data.into() }
    }

    /// Raw image bytes with their MIME type
    pub fn bytes(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self::Bytes {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Render the image as a reference a vision model accepts (URL or data URI)
    pub fn to_model_reference(&self) -> String {
        match self {
            Self::Url { url } => url.clone(),
            Self::Base64 { data } if data.starts_with("data:") => data.clone(),
            Self::Base64 { data } => format!("data:image/jpeg;base64,{}", data),
            Self::Bytes { mime_type, data } => crate::providers::normalize::to_data_uri(mime_type, data),
        }
    }

    /// Check if the input carries no image
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Url { url } => url.trim().is_empty(),
            Self::Base64 { data } => data.trim().is_empty(),
            Self::Bytes { data, .. } => data.is_empty(),
        }
    }
}

// Image payloads can be megabytes; keep them out of logs.
impl fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url { url } => f.debug_struct("Url").field("url", url).finish(),
            Self::Base64 { data } => write!(f, "Base64({} chars)", data.len()),
            Self::Bytes { mime_type, data } => {
                write!(f, "Bytes({}, {} bytes)", mime_type, data.len())
            }
        }
    }
}

/// A single generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    kind: GenerationKind,
    prompt: Prompt,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    output_shape: Option<OutputShape>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    image: Option<ImageInput>,
}

impl GenerationRequest {
    /// Request JSON output for a prompt, annotated with an output schema
    pub fn json(prompt: impl Into<Prompt>, schema: Value) -> Self {
        Self {
            kind: GenerationKind::Json,
            prompt: prompt.into(),
            output_shape: Some(OutputShape::new(schema)),
            image: None,
        }
    }

    /// Request an image for a prompt
    pub fn image(prompt: impl Into<Prompt>) -> Self {
        Self {
            kind: GenerationKind::Image,
            prompt: prompt.into(),
            output_shape: None,
            image: None,
        }
    }

    /// Request structured data extracted from an image
    pub fn vision(image: ImageInput, instruction: impl Into<Prompt>, schema: Option<Value>) -> Self {
        Self {
            kind: GenerationKind::VisionExtract,
            prompt: instruction.into(),
            output_shape: schema.map(OutputShape::new),
            image: Some(image),
        }
    }

    /// Kind of generation requested
    pub fn kind(&self) -> GenerationKind {
        self.kind
    }

    /// Prompt payload
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// Output-shape descriptor, if any
    pub fn output_shape(&self) -> Option<&OutputShape> {
        self.output_shape.as_ref()
    }

    /// Image input (vision requests only)
    pub fn image_input(&self) -> Option<&ImageInput> {
        self.image.as_ref()
    }

    /// System instruction that asks the provider to answer in the declared shape.
    ///
    /// Returns `None` for image requests, which have no textual output.
    pub fn schema_instruction(&self, style: InstructionStyle) -> Option<String> {
        if !self.kind.expects_json() {
            return None;
        }

        let mut instruction = match &self.output_shape {
            Some(shape) => format!(
                "You are a professional analyst. Your output must be only a JSON object \
                 that conforms to this JSON Schema: {}. Use English for every key name.",
                shape.schema()
            ),
            None => "You are a professional analyst. Your output must be only a JSON object. \
                     Use English for every key name."
                .to_string(),
        };

        if style == InstructionStyle::JsonMode {
            instruction.push_str(
                " Return the JSON content directly, without Markdown code fences such as ```json.",
            );
        }

        Some(instruction)
    }
}

/// Role of a chat message sent to a text provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions that guide the model's behavior
    System,
    /// Caller input
    User,
}

/// A plain-text chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Text content
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Build the `[system, user]` message pair most text providers expect
pub fn chat_messages(request: &GenerationRequest, style: InstructionStyle) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if let Some(instruction) = request.schema_instruction(style) {
        messages.push(Message::system(instruction));
    }
    messages.push(Message::user(request.prompt().as_text()));
    messages
}

/// Raw provider output, before normalization
#[derive(Clone, PartialEq)]
pub enum RawOutput {
    /// Text, possibly wrapped in Markdown fences
    Text(String),
    /// Inline binary image data
    InlineImage { mime_type: String, data: Vec<u8> },
    /// Remote image locator
    ImageUrl(String),
}

impl fmt::Debug for RawOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::InlineImage { mime_type, data } => {
                write!(f, "InlineImage({}, {} bytes)", mime_type, data.len())
            }
            Self::ImageUrl(url) => f.debug_tuple("ImageUrl").field(url).finish(),
        }
    }
}

/// Normalized output returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum GeneratedOutput {
    /// Parsed JSON (json and vision kinds)
    Json(Value),
    /// Inline image re-encoded as a `data:` URI
    ImageDataUri(String),
    /// Remote image URL
    ImageUrl(String),
}

impl GeneratedOutput {
    /// Borrow the JSON value, if this is a JSON output
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Take the JSON value, if this is a JSON output
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Displayable image reference (data URI or URL), if this is an image output
    pub fn image_url(&self) -> Option<&str> {
        match self {
            Self::ImageDataUri(uri) | Self::ImageUrl(uri) => Some(uri),
            Self::Json(_) => None,
        }
    }
}
