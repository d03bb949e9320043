//! Output normalization
//!
//! Turns raw provider output into the `GeneratedOutput` a caller receives.
//! Text outputs are stripped of Markdown fences and parsed as JSON; image
//! outputs become a displayable reference. Every failure here is fatal for the
//! attempt that produced the output.

use crate::protocol::types::{GeneratedOutput, GenerationKind, RawOutput};
use crate::providers::error::ProviderError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

const FENCE: &str = "```";

/// Extract the payload of the first fenced block, or the whole text if unfenced.
///
/// A language tag right after the opening fence (`json`, `JSON`, `jsonc`, ...)
/// is skipped. An unterminated fence yields everything after the opening fence.
pub fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find(FENCE) else {
        return text.trim();
    };

    let after_open = &text[open + FENCE.len()..];
    let tag_len = after_open
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')))
        .unwrap_or(after_open.len());
    let body = &after_open[tag_len..];

    match body.find(FENCE) {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Parse textual output as JSON, unwrapping a fenced block if present
pub fn normalize_json(text: &str, provider: &str) -> Result<Value, ProviderError> {
    if text.trim().is_empty() {
        return Err(ProviderError::empty(provider));
    }

    let payload = strip_code_fence(text);
    serde_json::from_str(payload).map_err(|e| {
        ProviderError::parse(format!("{} (from {}): {}", e, provider, preview(payload)))
    })
}

/// Encode bytes as a `data:` URI
pub fn to_data_uri(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
}

/// Normalize raw output for the given generation kind
pub fn normalize(
    kind: GenerationKind,
    raw: RawOutput,
    provider: &str,
) -> Result<GeneratedOutput, ProviderError> {
    match (kind.expects_json(), raw) {
        (true, RawOutput::Text(text)) => normalize_json(&text, provider).map(GeneratedOutput::Json),
        (false, RawOutput::InlineImage { mime_type, data }) => {
            if data.is_empty() {
                return Err(ProviderError::empty(provider));
            }
            Ok(GeneratedOutput::ImageDataUri(to_data_uri(&mime_type, &data)))
        }
        (false, RawOutput::ImageUrl(url)) => {
            let url = url.trim();
            if url.is_empty() {
                return Err(ProviderError::empty(provider));
            }
            Ok(GeneratedOutput::ImageUrl(url.to_string()))
        }
        (_, raw) => Err(ProviderError::UnsupportedKind {
            message: format!("{} returned {:?} for a {} request", provider, raw, kind),
        }),
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX).collect();
        format!("{}...", head)
    }
}
