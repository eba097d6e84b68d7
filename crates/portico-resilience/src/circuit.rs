use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use portico_config::CircuitBreakerConfig;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ResilienceError;

/// Observable circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Requests flow through normally
    Closed,
    /// Requests are rejected until the cooldown elapses
    Open,
    /// A single probe request is allowed through
    HalfOpen,
}

impl CircuitState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

struct Inner {
    state: CircuitState,
    /// Failures recorded in the current rolling window
    failure_count: u32,
    window_start: Instant,
    /// When the next half-open probe becomes eligible
    next_attempt: Option<Instant>,
    /// Current cooldown, doubled after each failed probe
    cooldown: Duration,
    /// Whether a half-open probe is currently outstanding
    trial_in_flight: bool,
}

/// Per-dependency circuit breaker with a rolling failure window
///
/// Opens after `failure_threshold` failures inside `window_seconds`. While
/// open, exactly one probe request is admitted once the cooldown elapses; a
/// failed probe reopens the circuit with the cooldown doubled (capped at
/// `max_cooldown_seconds`), and a successful probe closes it.
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    window: Duration,
    base_cooldown: Duration,
    max_cooldown: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(name: impl Into<String>, config: &CircuitBreakerConfig) -> Self {
        let base_cooldown = Duration::from_secs(config.cooldown_seconds);
        Self {
            name: name.into(),
            failure_threshold: config.failure_threshold,
            window: Duration::from_secs(config.window_seconds),
            base_cooldown,
            max_cooldown: Duration::from_secs(config.max_cooldown_seconds),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                window_start: Instant::now(),
                next_attempt: None,
                cooldown: base_cooldown,
                trial_in_flight: false,
            }),
        }
    }

    /// Check whether the circuit admits a request.
    ///
    /// Transitions open -> half-open when the cooldown has elapsed and marks
    /// the caller as the outstanding probe. Concurrent callers during a probe
    /// are rejected.
    ///
    /// # Errors
    ///
    /// Returns `ResilienceError::CircuitOpen` when the circuit is open or a
    /// half-open probe is already in flight
    pub fn try_acquire(&self) -> Result<(), ResilienceError> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let now = Instant::now();
                match inner.next_attempt {
                    Some(at) if now >= at => {
                        inner.state = CircuitState::HalfOpen;
                        inner.trial_in_flight = true;
                        info!(dependency = %self.name, "circuit half-open, admitting probe request");
                        Ok(())
                    }
                    Some(at) => Err(self.rejection(at.saturating_duration_since(now))),
                    // Open without a deadline should not happen; fail safe
                    None => Err(self.rejection(inner.cooldown)),
                }
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    Err(self.rejection(inner.cooldown))
                } else {
                    inner.trial_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    /// Record a successful request, closing the circuit and resetting the
    /// cooldown to its base value
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        if inner.state != CircuitState::Closed {
            info!(dependency = %self.name, "circuit closed after successful probe");
        }

        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.window_start = Instant::now();
        inner.next_attempt = None;
        inner.cooldown = self.base_cooldown;
        inner.trial_in_flight = false;
    }

    /// Record a failed request.
    ///
    /// A failed half-open probe reopens the circuit with the cooldown
    /// doubled. In the closed state, failures outside the rolling window
    /// restart the count.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Instant::now();

        match inner.state {
            CircuitState::HalfOpen => {
                let doubled = (inner.cooldown * 2).min(self.max_cooldown);
                inner.cooldown = doubled;
                inner.state = CircuitState::Open;
                inner.next_attempt = Some(now + doubled);
                inner.trial_in_flight = false;
                warn!(
                    dependency = %self.name,
                    cooldown_secs = doubled.as_secs(),
                    "probe failed, circuit reopened with doubled cooldown"
                );
            }
            CircuitState::Closed => {
                if now.duration_since(inner.window_start) >= self.window {
                    inner.window_start = now;
                    inner.failure_count = 1;
                } else {
                    inner.failure_count += 1;
                }

                if inner.failure_count >= self.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.next_attempt = Some(now + inner.cooldown);
                    warn!(
                        dependency = %self.name,
                        failures = inner.failure_count,
                        cooldown_secs = inner.cooldown.as_secs(),
                        "failure threshold reached, circuit opened"
                    );
                }
            }
            // Late failures from requests admitted before the circuit opened
            CircuitState::Open => {}
        }
    }

    #[must_use]
    pub fn state(&self) -> CircuitState {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.state
    }

    /// Seconds until the next probe is eligible, if the circuit is open
    #[must_use]
    pub fn retry_after(&self) -> Option<u64> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match inner.state {
            CircuitState::Open => inner
                .next_attempt
                .map(|at| at.saturating_duration_since(Instant::now()).as_secs().max(1)),
            CircuitState::Closed | CircuitState::HalfOpen => None,
        }
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    fn rejection(&self, remaining: Duration) -> ResilienceError {
        ResilienceError::CircuitOpen {
            dependency: self.name.clone(),
            retry_after: remaining.as_secs().max(1),
        }
    }

    #[cfg(test)]
    fn backdate_next_attempt(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_attempt = Some(Instant::now() - Duration::from_millis(1));
    }
}

/// Snapshot of one breaker for health reporting
#[derive(Debug, Clone, Serialize)]
pub struct BreakerHealth {
    pub name: String,
    pub state: CircuitState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Registry of circuit breakers, one per upstream dependency
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Get or create the breaker for a dependency
    #[must_use]
    pub fn breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, &self.config)))
            .clone()
    }

    /// Snapshot every registered breaker for the health endpoint
    #[must_use]
    pub fn snapshot(&self) -> Vec<BreakerHealth> {
        let mut health: Vec<BreakerHealth> = self
            .breakers
            .iter()
            .map(|entry| BreakerHealth {
                name: entry.key().clone(),
                state: entry.value().state(),
                retry_after: entry.value().retry_after(),
            })
            .collect();
        health.sort_by(|a, b| a.name.cmp(&b.name));
        health
    }

    /// Count of (healthy, total) registered dependencies
    #[must_use]
    pub fn health_counts(&self) -> (usize, usize) {
        let total = self.breakers.len();
        let healthy = self.breakers.iter().filter(|e| e.value().is_healthy()).count();
        (healthy, total)
    }
}
