use std::fmt;

/// Header carrying a caller-supplied correlation identifier
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Identifier tying together all log lines and error bodies for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Take the inbound header value when it is well-formed, else generate one
    ///
    /// Well-formed means 8 to 128 characters of `[A-Za-z0-9_-]`. Anything
    /// else (including an absent header) yields a fresh UUID.
    pub fn from_headers(headers: &http::HeaderMap) -> Self {
        headers
            .get(CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| is_well_formed(v))
            .map_or_else(Self::generate, |v| Self(v.to_owned()))
    }

    /// Generate a fresh correlation identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_well_formed(value: &str) -> bool {
    (8..=128).contains(&value.len())
        && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Runtime context for one inbound request
///
/// Constructed by middleware and passed to handlers via request extensions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation identifier for log lines and error bodies
    pub correlation_id: CorrelationId,
    /// Best available client identifier (edge header or peer address)
    pub client_key: String,
}

impl RequestContext {
    /// Create a minimal context for non-HTTP use (tests, embedded callers)
    pub fn empty() -> Self {
        Self {
            correlation_id: CorrelationId::generate(),
            client_key: "local".to_owned(),
        }
    }
}
