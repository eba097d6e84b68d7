use std::sync::Arc;

use axum::Json;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use portico_config::AuthConfig;
use portico_core::{CorrelationId, HttpError, error_body};
use portico_gateway::GatewayError;
use portico_ratelimit::{RequestLimiter, RouteClass};
use secrecy::ExposeSecret;

use crate::client_ip::ClientIp;

/// Static API-key authentication middleware.
///
/// Accepts `Authorization: Bearer <key>` or `x-api-key: <key>`. Missing
/// credentials yield 401, wrong credentials 403. The auth rate class is
/// checked before any key comparison to bound brute-force attempts.
pub async fn auth_middleware(
    config: Arc<AuthConfig>,
    limiter: Option<Arc<RequestLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if config.public_paths.iter().any(|p| p == path) {
        return next.run(request).await;
    }

    if let Some(ref limiter) = limiter {
        let client = request
            .extensions()
            .get::<ClientIp>()
            .map_or("unknown", |ip| ip.0.as_str());
        if let Err(e) = limiter.check(RouteClass::Auth, client) {
            return reject(GatewayError::from(e), &request);
        }
    }

    let Some(presented) = extract_key(&request) else {
        return reject(GatewayError::Authentication, &request);
    };

    let accepted = config
        .api_keys
        .iter()
        .any(|key| key.expose_secret() == presented);

    if accepted {
        next.run(request).await
    } else {
        reject(GatewayError::Authorization, &request)
    }
}

fn extract_key(request: &Request) -> Option<String> {
    if let Some(auth) = request.headers().get("authorization")
        && let Ok(value) = auth.to_str()
        && let Some(token) = value.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_owned());
    }

    request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_owned())
}

fn reject(error: GatewayError, request: &Request) -> Response {
    let correlation_id = CorrelationId::from_headers(request.headers());
    (error.status_code(), Json(error_body(&error, &correlation_id))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_headers(headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder().uri("/v1/completions");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn bearer_token_is_extracted() {
        let request = request_with_headers(&[("authorization", "Bearer sekrit")]);
        assert_eq!(extract_key(&request).as_deref(), Some("sekrit"));
    }

    #[test]
    fn api_key_header_is_extracted() {
        let request = request_with_headers(&[("x-api-key", "sekrit")]);
        assert_eq!(extract_key(&request).as_deref(), Some("sekrit"));
    }

    #[test]
    fn bearer_takes_precedence() {
        let request = request_with_headers(&[("authorization", "Bearer a"), ("x-api-key", "b")]);
        assert_eq!(extract_key(&request).as_deref(), Some("a"));
    }

    #[test]
    fn missing_credentials_yield_none() {
        let request = request_with_headers(&[]);
        assert!(extract_key(&request).is_none());
    }
}
