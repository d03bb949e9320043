//! Table tests for transient/fatal classification

use genway_core::http::error::map_http_error;
use genway_core::providers::{ErrorMapper, ProviderError, RetryPolicy, TransientKind};
use reqwest::StatusCode;
use test_case::test_case;
use uuid::Uuid;

#[test_case(400, false ; "bad request")]
#[test_case(401, false ; "unauthorized")]
#[test_case(403, false ; "forbidden")]
#[test_case(404, false ; "not found")]
#[test_case(408, true ; "request timeout")]
#[test_case(429, true ; "rate limited")]
#[test_case(500, false ; "internal error")]
#[test_case(502, true ; "bad gateway")]
#[test_case(503, true ; "unavailable")]
#[test_case(504, true ; "gateway timeout")]
#[test_case(529, true ; "overloaded")]
fn status_retryability(status: u16, retryable: bool) {
    let status = StatusCode::from_u16(status).unwrap();
    let error = map_http_error(status, None, Some("boom".to_string()), Uuid::new_v4());
    assert_eq!(error.is_retryable(), retryable, "{:?}", error);
}

#[test_case("Throttling.RateQuota", "Requests rate limit exceeded", Some(TransientKind::RateLimit) ; "throttled")]
#[test_case("InvalidApiKey", "Invalid API-key provided.", None ; "bad key")]
#[test_case("InternalError", "The server is busy, please retry", Some(TransientKind::Overloaded) ; "busy")]
#[test_case("DataInspectionFailed", "Output data may contain inappropriate content.", None ; "content filter")]
fn provider_code_classification(code: &str, message: &str, kind: Option<TransientKind>) {
    assert_eq!(ErrorMapper::from_provider_code(code, message).transient_kind(), kind);
}

#[test_case(ProviderError::network("connection reset"), true ; "network")]
#[test_case(ProviderError::Timeout, true ; "timeout")]
#[test_case(ProviderError::RateLimit { retry_after: None }, false ; "rate limit excluded")]
#[test_case(ProviderError::parse("bad"), false ; "parse is fatal")]
fn network_only_policy(error: ProviderError, retried: bool) {
    let policy = RetryPolicy::tls_resilient()
        .retrying_on(vec![TransientKind::Network, TransientKind::Timeout]);
    assert_eq!(policy.should_retry(&error, 1), retried);
    assert!(!policy.should_retry(&error, policy.max_attempts));
}
