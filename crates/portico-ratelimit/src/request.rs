use std::time::Duration;

use portico_config::{RateLimitConfig, RouteLimit};
use tracing::debug;
use uuid::Uuid;

use crate::{error::RateLimitError, memory::MemoryLimiter};

/// Route classes with independent quotas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Auth,
    Completions,
    Streaming,
    Health,
}

impl RouteClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Completions => "completions",
            Self::Streaming => "streaming",
            Self::Health => "health",
        }
    }
}

/// Request rate limiter with a global quota plus per-route-class quotas,
/// all keyed by client IP.
///
/// Keys are namespaced with a per-process instance id so that quota state
/// never collides across restarts or co-located instances.
pub struct RequestLimiter {
    instance: String,
    global: Option<MemoryLimiter>,
    auth: Option<MemoryLimiter>,
    completions: Option<MemoryLimiter>,
    streaming: Option<MemoryLimiter>,
    health: Option<MemoryLimiter>,
}

impl RequestLimiter {
    /// Create from configuration
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError::Config` if any configured window fails to
    /// parse or any quota is invalid
    pub fn new(config: &RateLimitConfig) -> Result<Self, RateLimitError> {
        Ok(Self {
            instance: Uuid::new_v4().to_string(),
            global: build_limiter(config.global.as_ref())?,
            auth: build_limiter(config.auth.as_ref())?,
            completions: build_limiter(config.completions.as_ref())?,
            streaming: build_limiter(config.streaming.as_ref())?,
            health: build_limiter(config.health.as_ref())?,
        })
    }

    /// Check the global quota followed by the route class quota for one
    /// client
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError::Exceeded` when either quota is exhausted
    pub fn check(&self, class: RouteClass, client_ip: &str) -> Result<(), RateLimitError> {
        if let Some(ref global) = self.global {
            global.check(&self.key("global", client_ip)).inspect_err(|_| {
                debug!(client_ip, "global rate limit exceeded");
            })?;
        }

        let limiter = match class {
            RouteClass::Auth => &self.auth,
            RouteClass::Completions => &self.completions,
            RouteClass::Streaming => &self.streaming,
            RouteClass::Health => &self.health,
        };

        if let Some(limiter) = limiter {
            limiter.check(&self.key(class.as_str(), client_ip)).inspect_err(|_| {
                debug!(client_ip, class = class.as_str(), "route rate limit exceeded");
            })?;
        }

        Ok(())
    }

    fn key(&self, class: &str, client_ip: &str) -> String {
        format!("{}:{class}:{client_ip}", self.instance)
    }
}

fn build_limiter(limit: Option<&RouteLimit>) -> Result<Option<MemoryLimiter>, RateLimitError> {
    limit
        .map(|rl| {
            let window = parse_duration(&rl.window)?;
            MemoryLimiter::new(rl.requests, window)
        })
        .transpose()
}

fn parse_duration(s: &str) -> Result<Duration, RateLimitError> {
    duration_str::parse(s).map_err(|e| RateLimitError::Config(format!("invalid duration '{s}': {e}")))
}
