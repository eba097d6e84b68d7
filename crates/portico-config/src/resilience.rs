use serde::Deserialize;

/// Resilience configuration wrapping every upstream call
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResilienceConfig {
    /// Circuit breaker thresholds
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Graceful degradation behavior
    #[serde(default)]
    pub degradation: DegradationConfig,
    /// Total upstream attempts per request (1 = no retry)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            circuit_breaker: CircuitBreakerConfig::default(),
            degradation: DegradationConfig::default(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Circuit breaker thresholds for one dependency
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CircuitBreakerConfig {
    /// Failures within the window before the circuit opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Rolling failure window in seconds
    #[serde(default = "default_window")]
    pub window_seconds: u64,
    /// Initial cooldown before a half-open probe is allowed
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: u64,
    /// Cap for the doubled cooldown after failed probes
    #[serde(default = "default_max_cooldown")]
    pub max_cooldown_seconds: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            window_seconds: default_window(),
            cooldown_seconds: default_cooldown(),
            max_cooldown_seconds: default_max_cooldown(),
        }
    }
}

/// Graceful degradation behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DegradationConfig {
    /// Whether fallback strategies run at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

const fn default_max_attempts() -> u32 {
    2
}
const fn default_failure_threshold() -> u32 {
    5
}
const fn default_window() -> u64 {
    60
}
const fn default_cooldown() -> u64 {
    30
}
const fn default_max_cooldown() -> u64 {
    300
}
const fn default_enabled() -> bool {
    true
}
