use std::{num::NonZeroU32, sync::Arc, time::Duration};

use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DashMapStateStore};

use crate::error::RateLimitError;

type KeyedLimiter = RateLimiter<String, DashMapStateStore<String>, DefaultClock>;

/// In-memory keyed rate limiter backed by governor
#[derive(Clone)]
pub struct MemoryLimiter {
    limiter: Arc<KeyedLimiter>,
}

impl MemoryLimiter {
    /// Create a limiter allowing `max_requests` per `window`
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError::Config` if the window is zero or the quota
    /// cannot be represented
    pub fn new(max_requests: u32, window: Duration) -> Result<Self, RateLimitError> {
        if window.as_secs() == 0 {
            return Err(RateLimitError::Config("rate limit window must be > 0".to_owned()));
        }

        let burst = NonZeroU32::new(max_requests)
            .ok_or_else(|| RateLimitError::Config("max_requests must be > 0".to_owned()))?;

        // Convert requests-per-window into governor's replenish interval
        let per_second = f64::from(max_requests) / window.as_secs_f64();
        let replenish_interval = Duration::from_secs_f64(1.0 / per_second);

        let quota = Quota::with_period(replenish_interval)
            .ok_or_else(|| RateLimitError::Config("invalid rate limit period".to_owned()))?
            .allow_burst(burst);

        Ok(Self {
            limiter: Arc::new(RateLimiter::dashmap(quota)),
        })
    }

    /// Check whether a request is allowed for the given key
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError::Exceeded` with the seconds until the limit
    /// resets when the key is over quota
    pub fn check(&self, key: &str) -> Result<(), RateLimitError> {
        match self.limiter.check_key(&key.to_owned()) {
            Ok(()) => Ok(()),
            Err(not_until) => {
                let retry_after =
                    not_until.wait_time_from(governor::clock::Clock::now(&governor::clock::DefaultClock::default()));
                Err(RateLimitError::Exceeded {
                    retry_after: retry_after.as_secs().max(1),
                })
            }
        }
    }
}
