//! HTTP error mapping utilities

use crate::providers::error::{ErrorMapper, ProviderError};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Map HTTP status code and response body to a ProviderError
pub fn map_http_error(
    status: StatusCode,
    headers: Option<&HeaderMap>,
    body: Option<String>,
    request_id: Uuid,
) -> ProviderError {
    let error_details = body
        .as_ref()
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| extract_error_details(&v));

    let error_message = error_details
        .as_ref()
        .map(|d| d.message.clone())
        .or_else(|| body.clone().filter(|b| !b.trim().is_empty()))
        .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

    let message_with_id = format!("{} [request_id: {}]", error_message, request_id);

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = headers
            .and_then(|h| h.get(reqwest::header::RETRY_AFTER))
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after)
            .or_else(|| {
                error_details
                    .as_ref()
                    .and_then(|d| d.retry_after_seconds)
                    .map(Duration::from_secs)
            });
        return ProviderError::RateLimit { retry_after };
    }

    let mapped = ErrorMapper::from_status_code(status.as_u16(), Some(&message_with_id));
    if mapped.is_retryable() || matches!(mapped, ProviderError::Authentication { .. }) {
        return mapped;
    }

    // DashScope reports throttling and key problems through `code` as well.
    match error_details.and_then(|d| d.code) {
        Some(code) => ErrorMapper::from_provider_code(&code, &message_with_id),
        None => mapped,
    }
}

/// Error details extracted from response body
struct ErrorDetails {
    code: Option<String>,
    message: String,
    retry_after_seconds: Option<u64>,
}

/// Extract error details from JSON response
fn extract_error_details(json: &Value) -> Option<ErrorDetails> {
    // OpenAI / Gemini format: { "error": { "message": "...", "code": ..., "status": "..." } }
    if let Some(error) = json.get("error").filter(|e| e.is_object()) {
        if let Some(message) = error.get("message").and_then(|v| v.as_str()) {
            let code = error
                .get("status")
                .or_else(|| error.get("code"))
                .or_else(|| error.get("type"))
                .and_then(value_as_code);
            return Some(ErrorDetails {
                code,
                message: message.to_string(),
                retry_after_seconds: error.get("retry_after").and_then(|v| v.as_u64()),
            });
        }
    }

    // DashScope format: { "code": "...", "message": "...", "request_id": "..." }
    if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
        return Some(ErrorDetails {
            code: json.get("code").and_then(value_as_code),
            message: message.to_string(),
            retry_after_seconds: json.get("retry_after").and_then(|v| v.as_u64()),
        });
    }

    if let Some(error) = json.get("error").and_then(|v| v.as_str()) {
        return Some(ErrorDetails {
            code: None,
            message: error.to_string(),
            retry_after_seconds: None,
        });
    }

    None
}

fn value_as_code(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse Retry-After header value
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    // Only the delay-seconds form; HTTP dates fall back to computed backoff.
    header_value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, RETRY_AFTER};

    fn id() -> Uuid {
        Uuid::nil()
    }

    #[test]
    fn test_rate_limit_reads_header() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, Some(&headers), None, id());
        assert_eq!(
            err,
            ProviderError::RateLimit {
                retry_after: Some(Duration::from_secs(7))
            }
        );
    }

    #[test]
    fn test_chat_completions_error_body() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let err = map_http_error(StatusCode::UNAUTHORIZED, None, Some(body.to_string()), id());
        match err {
            ProviderError::Authentication { message } => {
                assert!(message.starts_with("Incorrect API key provided"));
                assert!(message.contains("request_id"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dashscope_throttling_code_on_400() {
        let body = r#"{"code":"Throttling.RateQuota","message":"Requests rate limit exceeded","request_id":"abc"}"#;
        let err = map_http_error(StatusCode::BAD_REQUEST, None, Some(body.to_string()), id());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_dashscope_plain_failure_is_fatal() {
        let body = r#"{"code":"InvalidParameter","message":"Model not exist."}"#;
        let err = map_http_error(StatusCode::BAD_REQUEST, None, Some(body.to_string()), id());
        assert!(matches!(err, ProviderError::ProviderStatus { ref code, .. } if code == "InvalidParameter"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_overloaded_status_is_transient() {
        let err = map_http_error(StatusCode::SERVICE_UNAVAILABLE, None, None, id());
        assert!(matches!(err, ProviderError::Overloaded { status_code: 503, .. }));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("12"), Some(Duration::from_secs(12)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
