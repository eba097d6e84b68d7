use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ResilienceError;

/// Service level the gateway is currently operating at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceLevel {
    /// Everything enabled
    Full,
    /// Streaming disabled, core completions still served
    Degraded,
    /// Only health checks answered
    Minimal,
}

impl ServiceLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Degraded => "degraded",
            Self::Minimal => "minimal",
        }
    }

    /// Features available at this level
    #[must_use]
    pub const fn features(self) -> &'static [&'static str] {
        match self {
            Self::Full => &["completions", "streaming", "models", "health"],
            Self::Degraded => &["completions", "models", "health"],
            Self::Minimal => &["health"],
        }
    }

    const fn lower(self) -> Self {
        match self {
            Self::Full => Self::Degraded,
            Self::Degraded | Self::Minimal => Self::Minimal,
        }
    }

    const fn higher(self) -> Self {
        match self {
            Self::Full | Self::Degraded => Self::Full,
            Self::Minimal => Self::Degraded,
        }
    }
}

/// Context handed to fallback strategies when an upstream call fails
#[derive(Debug, Clone)]
pub struct DegradationContext {
    /// Logical operation that failed (e.g. "completion")
    pub operation: String,
    /// 1-based attempt number of the failed call
    pub attempt: u32,
    /// Display form of the upstream error
    pub error: String,
}

/// A degraded response together with the strategy that produced it
#[derive(Debug, Clone)]
pub struct Degraded<T> {
    pub value: T,
    pub strategy: &'static str,
}

type AppliesFn = dyn Fn(&DegradationContext) -> bool + Send + Sync;
type ExecuteFn<T> = dyn Fn(&DegradationContext) -> Option<T> + Send + Sync;

/// One fallback strategy. Strategies are plain records ordered by priority;
/// the first applicable one that produces a value wins.
pub struct DegradationStrategy<T> {
    pub name: &'static str,
    /// Lower runs first
    pub priority: u8,
    pub applies: Arc<AppliesFn>,
    pub execute: Arc<ExecuteFn<T>>,
}

/// Shared cache of recent successful responses, keyed by operation
pub struct ResponseCache<T> {
    entries: DashMap<String, T>,
}

impl<T: Clone> ResponseCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn store(&self, operation: &str, value: T) {
        self.entries.insert(operation.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, operation: &str) -> Option<T> {
        self.entries.get(operation).map(|v| v.clone())
    }
}

impl<T: Clone> Default for ResponseCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks the current service level and runs fallback strategies when
/// upstream calls fail
pub struct DegradationManager<T> {
    enabled: bool,
    level: RwLock<ServiceLevel>,
    strategies: Vec<DegradationStrategy<T>>,
    cache: Arc<ResponseCache<T>>,
}

impl<T: Clone> DegradationManager<T> {
    /// Build a manager over a shared response cache. Strategies typically
    /// capture the same cache to serve recent successes as fallbacks.
    #[must_use]
    pub fn new(
        enabled: bool,
        cache: Arc<ResponseCache<T>>,
        mut strategies: Vec<DegradationStrategy<T>>,
    ) -> Self {
        strategies.sort_by_key(|s| s.priority);
        Self {
            enabled,
            level: RwLock::new(ServiceLevel::Full),
            strategies,
            cache,
        }
    }

    /// Cache of recent successful responses, shared with the retry strategy
    #[must_use]
    pub fn cache(&self) -> Arc<ResponseCache<T>> {
        Arc::clone(&self.cache)
    }

    /// Record a successful upstream response for later fallback use
    pub fn record_success(&self, operation: &str, value: T) {
        self.cache.store(operation, value);
    }

    #[must_use]
    pub fn current_level(&self) -> ServiceLevel {
        *self.level.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_feature_available(&self, feature: &str) -> bool {
        self.current_level().features().contains(&feature)
    }

    /// Step the service level down one notch
    pub fn degrade_service_level(&self) {
        let mut level = self.level.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let next = level.lower();
        if next != *level {
            warn!(from = %level.as_str(), to = %next.as_str(), "service level degraded");
            *level = next;
        }
    }

    /// Step the service level up one notch
    pub fn restore_service_level(&self) {
        let mut level = self.level.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let next = level.higher();
        if next != *level {
            info!(from = %level.as_str(), to = %next.as_str(), "service level restored");
            *level = next;
        }
    }

    /// Adjust the service level from dependency health counts.
    ///
    /// Uses absolute targets so repeated calls with the same snapshot are
    /// idempotent: all healthy restores full service, more than 80% unhealthy
    /// forces minimal, more than 50% caps the level at degraded. A disabled
    /// manager never leaves full service.
    pub fn auto_adjust(&self, healthy: usize, total: usize) {
        if !self.enabled {
            return;
        }

        let mut level = self.level.write().unwrap_or_else(std::sync::PoisonError::into_inner);

        let target = if total == 0 || healthy == total {
            ServiceLevel::Full
        } else {
            #[allow(clippy::cast_precision_loss)]
            let unhealthy = (total - healthy) as f64 / total as f64;
            if unhealthy > 0.8 {
                ServiceLevel::Minimal
            } else if unhealthy > 0.5 {
                // Cap at degraded; never restore from minimal on a partial outage
                (*level).max(ServiceLevel::Degraded)
            } else {
                *level
            }
        };

        if target != *level {
            if target > *level {
                warn!(from = %level.as_str(), to = %target.as_str(), "service level degraded");
            } else {
                info!(from = %level.as_str(), to = %target.as_str(), "service level restored");
            }
            *level = target;
        }
    }

    /// Run fallback strategies for a failed operation.
    ///
    /// Strategies are consulted in priority order; the first applicable one
    /// that yields a value wins.
    ///
    /// # Errors
    ///
    /// Returns `ResilienceError::NoFallback` when degradation is disabled or
    /// no strategy produces a value
    pub fn execute(&self, ctx: &DegradationContext) -> Result<Degraded<T>, ResilienceError> {
        if !self.enabled {
            return Err(ResilienceError::NoFallback {
                operation: ctx.operation.clone(),
            });
        }

        for strategy in &self.strategies {
            if !(strategy.applies)(ctx) {
                continue;
            }
            if let Some(value) = (strategy.execute)(ctx) {
                info!(
                    operation = %ctx.operation,
                    strategy = strategy.name,
                    attempt = ctx.attempt,
                    "serving degraded response"
                );
                return Ok(Degraded {
                    value,
                    strategy: strategy.name,
                });
            }
        }

        Err(ResilienceError::NoFallback {
            operation: ctx.operation.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(attempt: u32) -> DegradationContext {
        DegradationContext {
            operation: "completion".to_owned(),
            attempt,
            error: "upstream timeout".to_owned(),
        }
    }

    fn cached_strategy(cache: Arc<ResponseCache<String>>) -> DegradationStrategy<String> {
        DegradationStrategy {
            name: "cached_response",
            priority: 10,
            applies: Arc::new(|ctx| ctx.attempt > 1),
            execute: Arc::new(move |ctx| cache.get(&ctx.operation)),
        }
    }

    fn static_strategy() -> DegradationStrategy<String> {
        DegradationStrategy {
            name: "static_response",
            priority: 20,
            applies: Arc::new(|_| true),
            execute: Arc::new(|_| Some("canned".to_owned())),
        }
    }

    fn manager_with_defaults() -> DegradationManager<String> {
        let cache = Arc::new(ResponseCache::new());
        // Registration order is reversed to exercise priority sorting
        DegradationManager::new(
            true,
            Arc::clone(&cache),
            vec![static_strategy(), cached_strategy(cache)],
        )
    }

    fn empty_manager() -> DegradationManager<String> {
        DegradationManager::new(true, Arc::new(ResponseCache::new()), vec![])
    }

    #[test]
    fn full_level_has_streaming() {
        let manager = empty_manager();
        assert!(manager.is_feature_available("streaming"));
        assert!(manager.is_feature_available("completions"));
    }

    #[test]
    fn degraded_level_drops_streaming() {
        let manager = empty_manager();
        manager.degrade_service_level();

        assert_eq!(manager.current_level(), ServiceLevel::Degraded);
        assert!(!manager.is_feature_available("streaming"));
        assert!(manager.is_feature_available("completions"));
    }

    #[test]
    fn minimal_level_only_serves_health() {
        let manager = empty_manager();
        manager.degrade_service_level();
        manager.degrade_service_level();

        assert_eq!(manager.current_level(), ServiceLevel::Minimal);
        assert!(!manager.is_feature_available("completions"));
        assert!(manager.is_feature_available("health"));

        // Clamped at the bottom
        manager.degrade_service_level();
        assert_eq!(manager.current_level(), ServiceLevel::Minimal);
    }

    #[test]
    fn restore_steps_back_up() {
        let manager = empty_manager();
        manager.degrade_service_level();
        manager.degrade_service_level();

        manager.restore_service_level();
        assert_eq!(manager.current_level(), ServiceLevel::Degraded);
        manager.restore_service_level();
        assert_eq!(manager.current_level(), ServiceLevel::Full);

        // Clamped at the top
        manager.restore_service_level();
        assert_eq!(manager.current_level(), ServiceLevel::Full);
    }

    #[test]
    fn auto_adjust_is_idempotent() {
        let manager = empty_manager();

        // 2 of 3 unhealthy -> degraded, and repeated calls stay there
        manager.auto_adjust(1, 3);
        assert_eq!(manager.current_level(), ServiceLevel::Degraded);
        manager.auto_adjust(1, 3);
        assert_eq!(manager.current_level(), ServiceLevel::Degraded);

        // All unhealthy -> minimal
        manager.auto_adjust(0, 3);
        assert_eq!(manager.current_level(), ServiceLevel::Minimal);

        // All healthy -> full
        manager.auto_adjust(3, 3);
        assert_eq!(manager.current_level(), ServiceLevel::Full);
    }

    #[test]
    fn auto_adjust_ignores_minor_outage() {
        let manager = empty_manager();
        manager.auto_adjust(2, 4);
        assert_eq!(manager.current_level(), ServiceLevel::Full);
    }

    #[test]
    fn static_fallback_applies_on_first_attempt() {
        let manager = manager_with_defaults();
        let degraded = manager.execute(&ctx(1)).unwrap();
        assert_eq!(degraded.strategy, "static_response");
        assert_eq!(degraded.value, "canned");
    }

    #[test]
    fn cached_fallback_wins_on_retry() {
        let manager = manager_with_defaults();
        manager.record_success("completion", "cached".to_owned());

        let degraded = manager.execute(&ctx(2)).unwrap();
        assert_eq!(degraded.strategy, "cached_response");
        assert_eq!(degraded.value, "cached");
    }

    #[test]
    fn empty_cache_falls_through_to_static() {
        let manager = manager_with_defaults();
        let degraded = manager.execute(&ctx(2)).unwrap();
        assert_eq!(degraded.strategy, "static_response");
    }

    #[test]
    fn disabled_manager_never_auto_adjusts() {
        let manager =
            DegradationManager::new(false, Arc::new(ResponseCache::<String>::new()), vec![]);
        manager.auto_adjust(0, 3);
        assert_eq!(manager.current_level(), ServiceLevel::Full);
    }

    #[test]
    fn disabled_manager_surfaces_no_fallback() {
        let manager =
            DegradationManager::new(false, Arc::new(ResponseCache::new()), vec![static_strategy()]);
        assert!(matches!(
            manager.execute(&ctx(1)),
            Err(ResilienceError::NoFallback { .. })
        ));
    }

    #[test]
    fn no_applicable_strategy_surfaces_no_fallback() {
        let manager = empty_manager();
        assert!(matches!(
            manager.execute(&ctx(1)),
            Err(ResilienceError::NoFallback { .. })
        ));
    }
}
