use http::StatusCode;
use portico_core::HttpError;
use portico_ratelimit::RateLimitError;
use portico_resilience::ResilienceError;
use thiserror::Error;

/// Errors that can occur while serving a completion request
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Client sent a structurally invalid request
    #[error("invalid request field '{field}': {message}")]
    Validation { field: String, message: String },

    /// Request lacks required authentication credentials
    #[error("authentication required")]
    Authentication,

    /// Credentials were presented but are not valid
    #[error("invalid credentials")]
    Authorization,

    /// Client has exceeded their rate limit
    #[error("rate limit exceeded")]
    RateLimited {
        /// Seconds until the limit resets
        retry_after: u64,
    },

    /// The upstream circuit is open; no call was attempted
    #[error("upstream temporarily unavailable, circuit open")]
    CircuitOpen {
        /// Seconds until the next probe is allowed
        retry_after: u64,
    },

    /// Upstream call exceeded the request deadline
    #[error("upstream request timed out")]
    Timeout,

    /// Upstream could not be reached or returned a transient failure
    #[error("upstream network error: {0}")]
    Network(String),

    /// No fallback could produce a response
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Upstream payload was missing required content
    #[error("malformed upstream response: {0}")]
    Transform(String),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl GatewayError {
    /// Whether this error should count against the upstream circuit breaker
    #[must_use]
    pub const fn is_upstream_failure(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_) | Self::Transform(_))
    }
}

impl From<ResilienceError> for GatewayError {
    fn from(err: ResilienceError) -> Self {
        match err {
            ResilienceError::CircuitOpen { retry_after, .. } => Self::CircuitOpen { retry_after },
            ResilienceError::NoFallback { operation } => Self::ServiceUnavailable(operation),
        }
    }
}

impl From<RateLimitError> for GatewayError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::Exceeded { retry_after } => Self::RateLimited { retry_after },
            RateLimitError::Config(msg) => Self::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl HttpError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } | Self::CircuitOpen { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Network(_) | Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Transform(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Authentication => "authentication_error",
            Self::Authorization => "authorization_error",
            Self::RateLimited { .. } => "rate_limit_error",
            Self::CircuitOpen { .. } => "circuit_breaker_error",
            Self::Timeout => "timeout_error",
            Self::Network(_) => "network_error",
            Self::ServiceUnavailable(_) => "service_unavailable_error",
            Self::Transform(_) | Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            // Non-operational errors never leak their message
            Self::Transform(_) | Self::Internal(_) => "an internal error occurred".to_owned(),
            other => other.to_string(),
        }
    }

    fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after } | Self::CircuitOpen { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
