//! Axum route handler for the unified completions endpoint

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::StreamExt;
use portico_core::{HttpError, RequestContext, error_body};
use portico_ratelimit::RouteClass;
use tracing::error;

use crate::convert;
use crate::error::GatewayError;
use crate::protocol::ExternalRequest;
use crate::state::GatewayState;
use crate::stream::{ClaudeChunkTransformer, OpenAiChunkTransformer, process};
use crate::validate;

/// Response header naming the fallback strategy that served the request
const DEGRADED_HEADER: &str = "x-degraded";

/// Build the gateway router
pub fn gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/v1/completions", routing::post(completions))
        .with_state(state)
}

/// Handle `POST /v1/completions` in either external shape
async fn completions(
    State(state): State<GatewayState>,
    axum::Extension(context): axum::Extension<RequestContext>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    match serve_completion(&state, &context, &body).await {
        Ok(response) => response,
        Err(e) => error_response(&e, &context),
    }
}

async fn serve_completion(
    state: &GatewayState,
    context: &RequestContext,
    body: &serde_json::Value,
) -> Result<Response, GatewayError> {
    if !state.degradation().is_feature_available("completions") {
        return Err(GatewayError::ServiceUnavailable(
            "completions are disabled at the current service level".to_owned(),
        ));
    }

    let request = validate::detect_and_validate(body)?;
    let upstream = convert::request::to_upstream(&request);

    if request.stream() {
        serve_streaming(state, context, &request, &upstream).await
    } else {
        serve_buffered(state, &request, &upstream).await
    }
}

async fn serve_buffered(
    state: &GatewayState,
    request: &ExternalRequest,
    upstream: &crate::protocol::azure::AzureRequest,
) -> Result<Response, GatewayError> {
    let outcome = state.complete(upstream).await?;

    let mut response = match request {
        ExternalRequest::LegacyCompletion(_) => {
            Json(convert::claude::to_claude_response(&outcome.response)?).into_response()
        }
        ExternalRequest::ChatCompletion(_) => {
            Json(convert::openai::to_openai_response(&outcome.response)?).into_response()
        }
    };

    if let Some(strategy) = outcome.degraded
        && let Ok(value) = strategy.parse()
    {
        response.headers_mut().insert(DEGRADED_HEADER, value);
    }

    Ok(response)
}

async fn serve_streaming(
    state: &GatewayState,
    context: &RequestContext,
    request: &ExternalRequest,
    upstream: &crate::protocol::azure::AzureRequest,
) -> Result<Response, GatewayError> {
    if !state.degradation().is_feature_available("streaming") {
        return Err(GatewayError::ServiceUnavailable(
            "streaming is disabled at the current service level".to_owned(),
        ));
    }

    // The streaming route class is only known after body parse, so it is
    // enforced here rather than in middleware
    if let Some(limiter) = state.limiter() {
        limiter.check(RouteClass::Streaming, &context.client_key)?;
    }

    let chunks = state.open_stream(upstream).await?;
    let timeout = state.stream_timeout();

    let frames = match request {
        ExternalRequest::LegacyCompletion(_) => process(ClaudeChunkTransformer::new(), chunks, timeout),
        ExternalRequest::ChatCompletion(_) => process(OpenAiChunkTransformer::new(), chunks, timeout),
    };

    let events = frames.map(|frame| {
        let mut event = Event::default().data(frame.data);
        if let Some(name) = frame.event {
            event = event.event(name);
        }
        Ok::<_, axum::Error>(event)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()).into_response())
}

/// Convert a gateway error into the wire error response
fn error_response(e: &GatewayError, context: &RequestContext) -> Response {
    if matches!(e, GatewayError::Internal(_) | GatewayError::Transform(_)) {
        error!(correlation_id = %context.correlation_id, error = %e, "request failed");
    }

    let body = error_body(e, &context.correlation_id);
    (e.status_code(), Json(body)).into_response()
}
