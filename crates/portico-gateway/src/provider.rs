//! HTTP client for the upstream Responses API

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use portico_config::UpstreamConfig;
use url::Url;

use crate::error::GatewayError;
use crate::protocol::azure::{AzureRequest, AzureResponse, AzureStreamChunk};
use crate::stream::ChunkStream;

/// Client for the upstream provider's Responses endpoint
pub struct AzureProvider {
    name: String,
    client: Client,
    endpoint: Url,
    api_key: SecretString,
    api_version: String,
}

impl AzureProvider {
    /// Create from upstream configuration
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Internal` if the HTTP client cannot be built
    pub fn new(config: &UpstreamConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Internal(anyhow::anyhow!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            name: config.name.clone(),
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
        })
    }

    /// Dependency name used for circuit breaker registration
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn responses_url(&self) -> String {
        let base = self.endpoint.as_str().trim_end_matches('/');
        format!("{base}/openai/responses?api-version={}", self.api_version)
    }

    /// Execute a non-streaming upstream call
    ///
    /// # Errors
    ///
    /// Returns `Timeout` / `Network` for transient failures, `Internal` when
    /// the upstream rejects the request itself
    pub async fn complete(&self, request: &AzureRequest) -> Result<AzureResponse, GatewayError> {
        let response = self
            .client
            .post(self.responses_url())
            .header("api-key", self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(upstream = %self.name, status = %status, "upstream returned error");
            return Err(map_status_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Transform(format!("failed to parse upstream response: {e}")))
    }

    /// Execute a streaming upstream call and decode its SSE chunks.
    ///
    /// Chunks that fail structural validation are skipped with a warning
    /// rather than failing the stream.
    ///
    /// # Errors
    ///
    /// Returns the same setup errors as [`Self::complete`]; mid-stream
    /// failures surface as `Err` items on the returned stream
    pub async fn complete_stream(&self, request: &AzureRequest) -> Result<ChunkStream, GatewayError> {
        let mut wire_request = request.clone();
        wire_request.stream = Some(true);

        let response = self
            .client
            .post(self.responses_url())
            .header("api-key", self.api_key.expose_secret())
            .json(&wire_request)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(upstream = %self.name, status = %status, "upstream stream request rejected");
            return Err(map_status_error(status, &body));
        }

        let chunks = response
            .bytes_stream()
            .eventsource()
            .filter_map(|result| {
                let item = match result {
                    Ok(event) => {
                        let data = event.data.trim().to_owned();
                        if data == "[DONE]" {
                            None
                        } else {
                            match serde_json::from_str::<AzureStreamChunk>(&data) {
                                Ok(chunk) => Some(Ok(chunk)),
                                Err(e) => {
                                    tracing::warn!(error = %e, "skipping malformed upstream chunk");
                                    None
                                }
                            }
                        }
                    }
                    Err(e) => Some(Err(GatewayError::Network(e.to_string()))),
                };
                futures_util::future::ready(item)
            });

        Ok(Box::pin(chunks))
    }
}

fn map_send_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Network(e.to_string())
    }
}

fn map_status_error(status: reqwest::StatusCode, body: &str) -> GatewayError {
    if status == reqwest::StatusCode::REQUEST_TIMEOUT {
        GatewayError::Timeout
    } else if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        GatewayError::Network(format!("upstream returned {status}"))
    } else {
        // 4xx means the request we built was rejected; not the client's fault
        GatewayError::Internal(anyhow::anyhow!("upstream rejected request ({status}): {body}"))
    }
}
