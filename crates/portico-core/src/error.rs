use http::StatusCode;

use crate::context::CorrelationId;
use crate::redact;

/// Trait for domain errors that can be converted to HTTP responses
///
/// Implemented by each feature crate's error type. The server layer
/// converts these into actual HTTP responses, keeping domain errors
/// decoupled from axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type (e.g. `validation_error`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;

    /// Seconds after which the caller may retry, when known
    fn retry_after(&self) -> Option<u64> {
        None
    }
}

/// Build the wire error body for an `HttpError`
///
/// Shape: `{ "error": { "type", "message", "correlationId", "retryAfter"? } }`.
/// The message passes through redaction so upstream details never leak
/// credentials, emails, or URLs to callers.
pub fn error_body<E: HttpError + ?Sized>(error: &E, correlation_id: &CorrelationId) -> serde_json::Value {
    let mut detail = serde_json::json!({
        "type": error.error_type(),
        "message": redact::sanitize(&error.client_message()),
        "correlationId": correlation_id.as_str(),
    });

    if let Some(retry_after) = error.retry_after()
        && let Some(obj) = detail.as_object_mut()
    {
        obj.insert("retryAfter".to_owned(), serde_json::json!(retry_after));
    }

    serde_json::json!({ "error": detail })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fake;

    impl std::fmt::Display for Fake {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "limit hit, key sk-abc123def456ghi789jkl012")
        }
    }
    impl std::error::Error for Fake {}

    impl HttpError for Fake {
        fn status_code(&self) -> StatusCode {
            StatusCode::TOO_MANY_REQUESTS
        }
        fn error_type(&self) -> &str {
            "rate_limit_error"
        }
        fn client_message(&self) -> String {
            self.to_string()
        }
        fn retry_after(&self) -> Option<u64> {
            Some(30)
        }
    }

    #[test]
    fn body_carries_type_correlation_and_retry_after() {
        let id = CorrelationId::generate();
        let body = error_body(&Fake, &id);
        assert_eq!(body["error"]["type"], "rate_limit_error");
        assert_eq!(body["error"]["correlationId"], id.as_str());
        assert_eq!(body["error"]["retryAfter"], 30);
    }

    #[test]
    fn body_message_is_redacted() {
        let id = CorrelationId::generate();
        let body = error_body(&Fake, &id);
        let message = body["error"]["message"].as_str().unwrap();
        assert!(!message.contains("sk-abc123"));
    }
}
