//! Wire-level tests for the transport adapters against a mock HTTP server

mod common;

use common::init_tracing;
use genway_core::config::{GatewayConfig, ProviderConfig, SecretString};
use genway_core::http::client::HttpClient;
use genway_core::http::HttpExecutor;
use genway_core::protocol::{GenerationRequest, ImageInput, RawOutput};
use genway_core::providers::{
    AdapterSettings, DeepSeekAdapter, GeminiImageAdapter, PollSettings, ProviderError, ProviderType,
    QwenTextAdapter, QwenVlAdapter, RetryPolicy, TransportAdapter, WanxImageAdapter,
};
use genway_core::Gateway;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "sk-test-0123456789";

fn http() -> Arc<dyn HttpExecutor> {
    Arc::new(HttpClient::new().unwrap())
}

fn settings(provider_type: ProviderType, server: &MockServer) -> AdapterSettings {
    AdapterSettings::for_type(provider_type, KEY).with_base_url(server.uri())
}

fn json_request() -> GenerationRequest {
    GenerationRequest::json("List three colours", json!({"type": "array"}))
}

fn qwen_body(content: &str) -> serde_json::Value {
    json!({
        "output": {
            "choices": [{"finish_reason": "stop", "message": {"role": "assistant", "content": content}}]
        },
        "usage": {"input_tokens": 12, "output_tokens": 8},
        "request_id": "4f5a-req"
    })
}

fn deepseek_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

#[tokio::test]
async fn test_qwen_text_request_shape() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/services/aigc/text-generation/generation"))
        .and(header("authorization", format!("Bearer {}", KEY).as_str()))
        .and(body_partial_json(json!({
            "model": "qwen-plus",
            "parameters": {"result_format": "message", "enable_search": true}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(qwen_body("[\"red\",\"green\",\"blue\"]")))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = QwenTextAdapter::new(settings(ProviderType::Qwen, &server), http());
    let raw = adapter.attempt(&json_request()).await.unwrap();

    assert!(matches!(raw, RawOutput::Text(ref text) if text == "[\"red\",\"green\",\"blue\"]"));
}

#[tokio::test]
async fn test_qwen_in_body_error_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "Throttling.RateQuota",
            "message": "Requests rate limit exceeded",
            "request_id": "r-9"
        })))
        .mount(&server)
        .await;

    let adapter = QwenTextAdapter::new(settings(ProviderType::Qwen, &server), http());
    let err = adapter.attempt(&json_request()).await.unwrap_err();

    assert!(matches!(err, ProviderError::RateLimit { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_deepseek_json_mode_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", format!("Bearer {}", KEY).as_str()))
        .and(body_partial_json(json!({
            "model": "deepseek-chat",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(deepseek_body("  {\"ok\": true}\n")))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = DeepSeekAdapter::new(settings(ProviderType::DeepSeek, &server), http());
    let raw = adapter.attempt(&json_request()).await.unwrap();

    assert!(matches!(raw, RawOutput::Text(ref text) if text == "{\"ok\": true}"));
    assert!(adapter.capabilities().supports_json_mode);
}

#[tokio::test]
async fn test_deepseek_blank_content_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deepseek_body("   ")))
        .mount(&server)
        .await;

    let adapter = DeepSeekAdapter::new(settings(ProviderType::DeepSeek, &server), http());
    let err = adapter.attempt(&json_request()).await.unwrap_err();

    assert_eq!(err, ProviderError::empty("deepseek"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_http_status_classification() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/unauthorized/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Authentication Fails", "type": "authentication_error"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/busy/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream busy"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/limited/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let adapter_at = |prefix: &str| {
        DeepSeekAdapter::new(
            AdapterSettings::for_type(ProviderType::DeepSeek, KEY)
                .with_base_url(format!("{}/{}", server.uri(), prefix)),
            http(),
        )
    };

    let err = adapter_at("unauthorized").attempt(&json_request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Authentication { ref message } if message.contains("Authentication Fails")));

    let err = adapter_at("busy").attempt(&json_request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Overloaded { status_code: 503, .. }));

    let err = adapter_at("limited").attempt(&json_request()).await.unwrap_err();
    assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
}

#[tokio::test]
async fn test_gemini_inline_image() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-image:generateContent"))
        .and(header("x-goog-api-key", KEY))
        .and(body_partial_json(json!({
            "contents": [{"parts": [{"text": "a red bicycle"}]}],
            "generationConfig": {"responseModalities": ["TEXT", "IMAGE"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Here is your bicycle."},
                    {"inlineData": {"mimeType": "image/png", "data": "iVBORw=="}}
                ]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = GeminiImageAdapter::new(settings(ProviderType::Gemini, &server), http());
    let raw = adapter.attempt(&GenerationRequest::image("a red bicycle")).await.unwrap();

    assert!(matches!(
        raw,
        RawOutput::InlineImage { ref mime_type, ref data } if mime_type == "image/png" && data == &[137, 80, 78, 71]
    ));
}

#[tokio::test]
async fn test_gemini_without_image_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "I cannot draw that."}]}}]
        })))
        .mount(&server)
        .await;

    let adapter = GeminiImageAdapter::new(settings(ProviderType::Gemini, &server), http());
    let err = adapter.attempt(&GenerationRequest::image("x")).await.unwrap_err();

    assert_eq!(err, ProviderError::empty("gemini"));
}

fn wanx(server: &MockServer) -> WanxImageAdapter {
    WanxImageAdapter::new(
        settings(ProviderType::Wanx, server).with_poll(PollSettings {
            interval: Duration::from_millis(10),
            max_polls: 3,
        }),
        http(),
    )
}

fn task_body(status: &str) -> serde_json::Value {
    json!({
        "output": {"task_id": "task-42", "task_status": status},
        "request_id": "r-1"
    })
}

async fn mount_submit(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/services/aigc/text2image/image-synthesis"))
        .and(header("X-DashScope-Async", "enable"))
        .and(body_partial_json(json!({
            "model": "wan2.5-t2i-preview",
            "input": {"prompt": "a lighthouse at dusk"},
            "parameters": {"n": 1, "size": "1280*1280"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_body("PENDING")))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_wanx_submit_then_poll() {
    let server = MockServer::start().await;
    mount_submit(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/task-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_body("RUNNING")))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/task-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": {
                "task_id": "task-42",
                "task_status": "SUCCEEDED",
                "results": [{"url": "https://dashscope-result.oss.example.com/lighthouse.png"}]
            },
            "request_id": "r-3"
        })))
        .mount(&server)
        .await;

    let raw = wanx(&server)
        .attempt(&GenerationRequest::image("a lighthouse at dusk"))
        .await
        .unwrap();

    assert!(matches!(
        raw,
        RawOutput::ImageUrl(ref url) if url == "https://dashscope-result.oss.example.com/lighthouse.png"
    ));
}

#[tokio::test]
async fn test_wanx_failed_task() {
    let server = MockServer::start().await;
    mount_submit(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/task-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": {
                "task_id": "task-42",
                "task_status": "FAILED",
                "code": "DataInspectionFailed",
                "message": "Input data may contain inappropriate content."
            },
            "request_id": "r-2"
        })))
        .mount(&server)
        .await;

    let err = wanx(&server)
        .attempt(&GenerationRequest::image("a lighthouse at dusk"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::ProviderStatus { ref code, .. } if code == "DataInspectionFailed"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_wanx_poll_budget_exhausted() {
    let server = MockServer::start().await;
    mount_submit(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/task-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_body("RUNNING")))
        .expect(3)
        .mount(&server)
        .await;

    let err = wanx(&server)
        .attempt(&GenerationRequest::image("a lighthouse at dusk"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::ProviderStatus { ref code, .. } if code == "TASK_TIMEOUT"));
}

#[tokio::test]
async fn test_qwen_vl_multimodal_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/services/aigc/multimodal-generation/generation"))
        .and(body_partial_json(json!({
            "model": "qwen3-vl-plus",
            "parameters": {"result_format": "message"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": {"choices": [{
                "finish_reason": "stop",
                "message": {"role": "assistant", "content": [{"text": "```json\n{\"title\":\"Invoice\"}\n```"}]}
            }]},
            "request_id": "r-vl"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = QwenVlAdapter::new(settings(ProviderType::QwenVl, &server), http());
    let request = GenerationRequest::vision(
        ImageInput::url("https://cdn.example.com/invoice.jpg"),
        "Extract the document title",
        Some(json!({"type": "object"})),
    );
    let raw = adapter.attempt(&request).await.unwrap();

    assert!(matches!(raw, RawOutput::Text(ref text) if text.contains("Invoice")));

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let messages = body["input"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["content"][0]["image"], "https://cdn.example.com/invoice.jpg");
    assert_eq!(messages[1]["content"][1]["text"], "Extract the document title");
}

#[tokio::test]
async fn test_gateway_falls_back_over_http() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/services/aigc/text-generation/generation"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "InvalidParameter",
            "message": "Range of input length should be [1, 30720]",
            "request_id": "r-bad"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deepseek_body("{\"colours\":[\"red\"]}")))
        .expect(1)
        .mount(&server)
        .await;

    let mut qwen = ProviderConfig::for_type(ProviderType::Qwen);
    qwen.api_key = Some(SecretString::from(KEY));
    qwen.base_url = Some(server.uri());
    let mut deepseek = ProviderConfig::for_type(ProviderType::DeepSeek);
    deepseek.api_key = Some(SecretString::from(KEY));
    deepseek.base_url = Some(server.uri());
    deepseek.retry_policy = Some(RetryPolicy::no_retry());

    let config = GatewayConfig {
        providers: vec![qwen, deepseek],
        ..Default::default()
    };
    let gateway = Gateway::from_config(&config).unwrap();

    let result = gateway
        .generate_json("List colours", json!({"type": "object"}), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.provider_used, "deepseek");
    assert!(result.used_fallback);
    assert_eq!(result.output.as_json(), Some(&json!({"colours": ["red"]})));
    assert_eq!(result.provider_errors.len(), 1);
    assert_eq!(result.provider_errors[0].provider, "qwen");
    assert_eq!(result.provider_errors[0].attempts, 1);
}
