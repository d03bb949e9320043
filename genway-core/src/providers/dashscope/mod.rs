//! DashScope transport adapters
//!
//! Qwen text generation, Qwen-VL extraction and Wanx image synthesis share
//! one credential, one host and one response envelope.

mod image;
mod text;
pub mod types;
mod vision;

pub use image::WanxImageAdapter;
pub use text::QwenTextAdapter;
pub use vision::QwenVlAdapter;

use crate::providers::error::{ErrorMapper, ProviderError, ProviderResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use types::{ChatOutput, DashScopeResponse};

/// Unwrap the DashScope envelope, surfacing an in-body error code
pub(crate) fn decode_output<O: DeserializeOwned>(body: Value, provider: &str) -> ProviderResult<O> {
    let response: DashScopeResponse<O> = serde_json::from_value(body)?;

    match response.output {
        Some(output) => Ok(output),
        None => match response.code.filter(|c| !c.is_empty()) {
            Some(code) => Err(ErrorMapper::from_provider_code(
                &code,
                &format!(
                    "{} [request_id: {}]",
                    response.message.unwrap_or_default(),
                    response.request_id.unwrap_or_default()
                ),
            )),
            None => Err(ProviderError::empty(provider)),
        },
    }
}

/// Content of the first choice of a `result_format: message` output
pub(crate) fn first_choice<C>(output: ChatOutput<C>, provider: &str) -> ProviderResult<C> {
    output
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::empty(provider))
}
