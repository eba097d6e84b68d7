//! Redaction of sensitive material from client-bound error messages
//!
//! Every message that reaches a caller passes through [`sanitize`],
//! regardless of error kind. Upstream providers are fond of echoing the
//! offending API key or full request URL back in their error bodies.

use std::sync::LazyLock;

use regex::Regex;

static API_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:sk|pk|rk)-[A-Za-z0-9_-]{16,}\b").expect("valid regex"));

static BEARER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]{8,}").expect("valid regex"));

static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(api[-_]?key|token|secret|password|authorization)\b\s*[:=]\s*\S+"#).expect("valid regex")
});

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex"));

static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bhttps?://\S+").expect("valid regex"));

/// Replace credentials, emails, and URLs with `[redacted]`
pub fn sanitize(message: &str) -> String {
    let out = API_KEY.replace_all(message, "[redacted]");
    let out = BEARER.replace_all(&out, "[redacted]");
    let out = KEY_VALUE.replace_all(&out, "$1=[redacted]");
    let out = EMAIL.replace_all(&out, "[redacted]");
    let out = URL.replace_all(&out, "[redacted]");
    out.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_keys_are_redacted() {
        let out = sanitize("upstream rejected key sk-proj1234567890abcdef");
        assert!(!out.contains("sk-proj"));
        assert!(out.contains("[redacted]"));
    }

    #[test]
    fn bearer_tokens_are_redacted() {
        let out = sanitize("header was Bearer eyJhbGciOiJIUzI1NiJ9.payload");
        assert!(!out.contains("eyJhbGci"));
    }

    #[test]
    fn key_value_pairs_are_redacted() {
        let out = sanitize("config error: api_key=abc123secret");
        assert!(!out.contains("abc123secret"));
        assert!(out.contains("api_key=[redacted]"));
    }

    #[test]
    fn emails_are_redacted() {
        let out = sanitize("owner ops@example.com must rotate credentials");
        assert!(!out.contains("ops@example.com"));
    }

    #[test]
    fn urls_are_redacted() {
        let out = sanitize("POST https://internal.host/openai/responses?api-version=preview failed");
        assert!(!out.contains("internal.host"));
    }

    #[test]
    fn plain_messages_pass_through() {
        assert_eq!(sanitize("model not found"), "model not found");
    }
}
