//! Shared gateway state: upstream provider wrapped in the resilience layer

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use portico_config::Config;
use portico_ratelimit::RequestLimiter;
use portico_resilience::{
    CircuitBreakerRegistry, DegradationContext, DegradationManager, DegradationStrategy, ResponseCache,
};
use tracing::warn;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::protocol::azure::{AzureOutputItem, AzureRequest, AzureResponse};
use crate::provider::AzureProvider;
use crate::stream::ChunkStream;

/// Operation name used for degradation context and response caching
const COMPLETION_OP: &str = "completion";

/// Placeholder content served by the lowest-priority fallback
const STATIC_FALLBACK_TEXT: &str =
    "The service is temporarily operating in degraded mode. Please retry your request shortly.";

/// A completion result, possibly produced by a fallback strategy
pub struct CompletionOutcome {
    pub response: AzureResponse,
    /// Name of the strategy that produced a degraded response, if any
    pub degraded: Option<&'static str>,
}

/// Process-wide gateway state shared across request handlers
#[derive(Clone)]
pub struct GatewayState {
    inner: Arc<Inner>,
}

struct Inner {
    provider: AzureProvider,
    breakers: CircuitBreakerRegistry,
    degradation: DegradationManager<AzureResponse>,
    limiter: Option<Arc<RequestLimiter>>,
    max_attempts: u32,
    stream_timeout: Duration,
}

impl GatewayState {
    /// Assemble the provider, breaker registry, and degradation manager
    /// from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &Config, limiter: Option<Arc<RequestLimiter>>) -> Result<Self, GatewayError> {
        let provider = AzureProvider::new(&config.upstream)?;
        let breakers = CircuitBreakerRegistry::new(config.resilience.circuit_breaker.clone());

        let cache = Arc::new(ResponseCache::new());
        let degradation = DegradationManager::new(
            config.resilience.degradation.enabled,
            Arc::clone(&cache),
            default_strategies(cache),
        );

        Ok(Self {
            inner: Arc::new(Inner {
                provider,
                breakers,
                degradation,
                limiter,
                max_attempts: config.resilience.max_attempts,
                stream_timeout: Duration::from_secs(config.upstream.request_timeout_secs),
            }),
        })
    }

    #[must_use]
    pub fn degradation(&self) -> &DegradationManager<AzureResponse> {
        &self.inner.degradation
    }

    #[must_use]
    pub fn breakers(&self) -> &CircuitBreakerRegistry {
        &self.inner.breakers
    }

    #[must_use]
    pub fn limiter(&self) -> Option<&RequestLimiter> {
        self.inner.limiter.as_deref()
    }

    /// Whole-stream deadline for streaming responses
    #[must_use]
    pub fn stream_timeout(&self) -> Duration {
        self.inner.stream_timeout
    }

    /// Execute a non-streaming completion under the resilience policy.
    ///
    /// Attempts are bounded by configuration; every failure is offered to
    /// the degradation manager before the original error is surfaced.
    ///
    /// # Errors
    ///
    /// Returns the last upstream error when no fallback strategy applies
    pub async fn complete(&self, request: &AzureRequest) -> Result<CompletionOutcome, GatewayError> {
        let breaker = self.inner.breakers.breaker(self.inner.provider.name());
        let mut last_error = None;
        let mut attempt = 0u32;

        while attempt < self.inner.max_attempts {
            attempt += 1;

            if let Err(e) = breaker.try_acquire() {
                last_error = Some(GatewayError::from(e));
                break;
            }

            match self.inner.provider.complete(request).await {
                Ok(response) => {
                    breaker.record_success();
                    self.inner.degradation.record_success(COMPLETION_OP, response.clone());
                    self.auto_adjust();
                    return Ok(CompletionOutcome {
                        response,
                        degraded: None,
                    });
                }
                Err(e) => {
                    warn!(attempt, error = %e, "upstream completion attempt failed");
                    if e.is_upstream_failure() {
                        breaker.record_failure();
                    }
                    last_error = Some(e);
                }
            }
        }

        self.auto_adjust();

        let error =
            last_error.unwrap_or_else(|| GatewayError::ServiceUnavailable(COMPLETION_OP.to_owned()));

        let ctx = DegradationContext {
            operation: COMPLETION_OP.to_owned(),
            attempt,
            error: error.to_string(),
        };

        match self.inner.degradation.execute(&ctx) {
            Ok(degraded) => Ok(CompletionOutcome {
                response: degraded.value,
                degraded: Some(degraded.strategy),
            }),
            // No fallback applied; the original error is more specific
            Err(_) => Err(error),
        }
    }

    /// Open a streaming completion under the circuit breaker.
    ///
    /// Streaming has no degraded fallback; a degraded service level
    /// disables the feature before this point.
    ///
    /// # Errors
    ///
    /// Returns `CircuitOpen` without contacting the upstream when the
    /// circuit is open, or the provider's setup error
    pub async fn open_stream(&self, request: &AzureRequest) -> Result<ChunkStream, GatewayError> {
        let breaker = self.inner.breakers.breaker(self.inner.provider.name());
        breaker.try_acquire().map_err(GatewayError::from)?;

        match self.inner.provider.complete_stream(request).await {
            Ok(stream) => {
                breaker.record_success();
                self.auto_adjust();
                Ok(stream)
            }
            Err(e) => {
                if e.is_upstream_failure() {
                    breaker.record_failure();
                }
                self.auto_adjust();
                Err(e)
            }
        }
    }

    fn auto_adjust(&self) {
        let (healthy, total) = self.inner.breakers.health_counts();
        self.inner.degradation.auto_adjust(healthy, total);
    }
}

/// The built-in fallback strategies: cached response on retries, then a
/// static placeholder
fn default_strategies(cache: Arc<ResponseCache<AzureResponse>>) -> Vec<DegradationStrategy<AzureResponse>> {
    vec![
        DegradationStrategy {
            name: "cached_response",
            priority: 10,
            applies: Arc::new(|ctx| ctx.attempt > 1),
            execute: Arc::new(move |ctx| cache.get(&ctx.operation)),
        },
        DegradationStrategy {
            name: "static_response",
            priority: 20,
            applies: Arc::new(|_| true),
            execute: Arc::new(|_| Some(static_fallback())),
        },
    ]
}

fn static_fallback() -> AzureResponse {
    let created = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    AzureResponse {
        id: format!("degraded-{}", Uuid::new_v4().simple()),
        object: "response".to_owned(),
        created,
        model: "degraded".to_owned(),
        output: vec![AzureOutputItem::Text {
            text: STATIC_FALLBACK_TEXT.to_owned(),
        }],
        usage: None,
    }
}
