use thiserror::Error;

/// Errors produced by the resilience layer
#[derive(Debug, Error)]
pub enum ResilienceError {
    /// The circuit for a dependency is open and the cooldown has not elapsed
    #[error("circuit breaker open for {dependency}, retry in {retry_after}s")]
    CircuitOpen {
        dependency: String,
        /// Seconds until the next half-open probe is allowed
        retry_after: u64,
    },

    /// No fallback strategy could produce a response
    #[error("no degradation strategy applies to {operation}")]
    NoFallback { operation: String },
}
