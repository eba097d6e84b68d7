use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use portico_core::{CorrelationId, RequestContext};

use crate::client_ip::ClientIp;

/// Middleware that constructs a `RequestContext` from the incoming request
///
/// Runs innermost so the correlation id and resolved client key are
/// available to every handler via request extensions.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = CorrelationId::from_headers(request.headers());

    let client_key = request
        .extensions()
        .get::<ClientIp>()
        .map_or_else(|| "unknown".to_owned(), |ip| ip.0.clone());

    let context = RequestContext {
        correlation_id,
        client_key,
    };
    request.extensions_mut().insert(context);

    next.run(request).await
}
