use super::decode_output;
use super::types::{
    ImageSynthesisInput, ImageSynthesisParameters, ImageSynthesisRequest, TaskOutput, TaskStatus,
};
use crate::http::HttpExecutor;
use crate::protocol::types::{GenerationRequest, RawOutput};
use crate::providers::adapter::{AdapterSettings, ProviderCapabilities, ProviderType, TransportAdapter};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

const IMAGE_SYNTHESIS_PATH: &str = "/api/v1/services/aigc/text2image/image-synthesis";
const TASKS_PATH: &str = "/api/v1/tasks";

/// Wanx text-to-image through DashScope's asynchronous task API
///
/// One attempt submits a task and then polls it until it settles; the whole
/// exchange counts as a single logical call.
pub struct WanxImageAdapter {
    settings: AdapterSettings,
    capabilities: ProviderCapabilities,
    http: Arc<dyn HttpExecutor>,
}

/// Where a task stands after one response
enum TaskState {
    Done(String),
    InFlight(String),
}

impl WanxImageAdapter {
    pub fn new(settings: AdapterSettings, http: Arc<dyn HttpExecutor>) -> Self {
        Self {
            settings,
            capabilities: ProviderCapabilities::serving(ProviderType::Wanx.default_kinds()),
            http,
        }
    }

    async fn submit(&self, prompt: String) -> ProviderResult<TaskState> {
        let body = serde_json::to_value(ImageSynthesisRequest {
            model: &self.settings.model,
            input: ImageSynthesisInput { prompt },
            parameters: ImageSynthesisParameters::default(),
        })?;

        let options = self
            .settings
            .bearer_options()
            .with_header("X-DashScope-Async", "enable");
        let response = self
            .http
            .post_json(&self.settings.endpoint(IMAGE_SYNTHESIS_PATH), &body, options)
            .await?;

        self.task_state(decode_output(response, self.name())?)
    }

    async fn poll(&self, task_id: &str) -> ProviderResult<String> {
        let url = self.settings.endpoint(&format!("{}/{}", TASKS_PATH, task_id));
        let poll = self.settings.poll;

        for check in 1..=poll.max_polls {
            tokio::time::sleep(poll.interval).await;

            let response = self.http.get_json(&url, self.settings.bearer_options()).await?;
            match self.task_state(decode_output(response, self.name())?)? {
                TaskState::Done(image_url) => return Ok(image_url),
                TaskState::InFlight(_) => {
                    debug!(provider = self.name(), task_id, check, "image task still running");
                }
            }
        }

        Err(ProviderError::ProviderStatus {
            code: "TASK_TIMEOUT".to_string(),
            message: format!(
                "task {} did not finish after {} status checks",
                task_id, poll.max_polls
            ),
        })
    }

    fn task_state(&self, output: TaskOutput) -> ProviderResult<TaskState> {
        // Some deployments answer synchronously with the results inline.
        if let Some(result) = output.results.into_iter().next() {
            return match result.url.filter(|url| !url.trim().is_empty()) {
                Some(url) => Ok(TaskState::Done(url)),
                None => Err(ProviderError::ProviderStatus {
                    code: result.code.unwrap_or_else(|| "TASK_FAILED".to_string()),
                    message: result.message.unwrap_or_else(|| "image result has no URL".to_string()),
                }),
            };
        }

        match output.task_status {
            Some(TaskStatus::Failed) | Some(TaskStatus::Canceled) | Some(TaskStatus::Unknown) => {
                Err(ProviderError::ProviderStatus {
                    code: output.code.unwrap_or_else(|| "TASK_FAILED".to_string()),
                    message: output.message.unwrap_or_else(|| "image task failed".to_string()),
                })
            }
            Some(TaskStatus::Succeeded) => Err(ProviderError::empty(self.name())),
            Some(TaskStatus::Pending) | Some(TaskStatus::Running) | None => match output.task_id {
                Some(task_id) => Ok(TaskState::InFlight(task_id)),
                None => Err(ProviderError::empty(self.name())),
            },
        }
    }
}

#[async_trait]
impl TransportAdapter for WanxImageAdapter {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn attempt(&self, request: &GenerationRequest) -> ProviderResult<RawOutput> {
        self.capabilities.ensure_supported(self.name(), request.kind())?;

        let image_url = match self.submit(request.prompt().as_text()).await? {
            TaskState::Done(url) => url,
            TaskState::InFlight(task_id) => {
                info!(provider = self.name(), task_id = %task_id, "image task submitted");
                self.poll(&task_id).await?
            }
        };

        Ok(RawOutput::ImageUrl(image_url))
    }
}
