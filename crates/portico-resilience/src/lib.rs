//! Resilience primitives for upstream calls: per-dependency circuit
//! breakers and graceful degradation with fallback strategies.

pub mod circuit;
pub mod degrade;
pub mod error;

pub use circuit::{BreakerHealth, CircuitBreaker, CircuitBreakerRegistry, CircuitState};
pub use degrade::{
    Degraded, DegradationContext, DegradationManager, DegradationStrategy, ResponseCache,
    ServiceLevel,
};
pub use error::ResilienceError;
