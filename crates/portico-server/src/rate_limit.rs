use std::sync::Arc;

use axum::Json;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use portico_core::{CorrelationId, HttpError, error_body};
use portico_gateway::GatewayError;
use portico_ratelimit::{RequestLimiter, RouteClass};

use crate::client_ip::ClientIp;

/// Rate limiting middleware; the streaming class is enforced in the
/// completions handler once the body has been parsed
pub async fn rate_limit_middleware(
    limiter: Arc<RequestLimiter>,
    health_path: Arc<str>,
    request: Request,
    next: Next,
) -> Response {
    let class = classify(request.uri().path(), &health_path);

    let client = request
        .extensions()
        .get::<ClientIp>()
        .map_or("unknown", |ip| ip.0.as_str());

    if let Err(e) = limiter.check(class, client) {
        let error = GatewayError::from(e);
        let correlation_id = CorrelationId::from_headers(request.headers());

        let mut response =
            (error.status_code(), Json(error_body(&error, &correlation_id))).into_response();
        if let Some(retry_after) = error.retry_after()
            && let Ok(value) = retry_after.to_string().parse()
        {
            response.headers_mut().insert("retry-after", value);
        }
        return response;
    }

    next.run(request).await
}

fn classify(path: &str, health_path: &str) -> RouteClass {
    if path == health_path {
        RouteClass::Health
    } else {
        RouteClass::Completions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_path_classified_separately() {
        assert_eq!(classify("/health", "/health"), RouteClass::Health);
        assert_eq!(classify("/v1/completions", "/health"), RouteClass::Completions);
    }

    #[test]
    fn configured_health_path_is_honored() {
        assert_eq!(classify("/status", "/status"), RouteClass::Health);
        assert_eq!(classify("/health", "/status"), RouteClass::Completions);
    }
}
