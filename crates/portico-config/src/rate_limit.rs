use serde::Deserialize;

/// Rate limiting configuration, one window per route class
///
/// Classes left unset are not limited. The `global` ceiling applies to every
/// request before the per-class check.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Global ceiling across all routes
    #[serde(default)]
    pub global: Option<RouteLimit>,
    /// Authentication attempts
    #[serde(default)]
    pub auth: Option<RouteLimit>,
    /// Non-streaming completion requests
    #[serde(default)]
    pub completions: Option<RouteLimit>,
    /// Streaming completion requests
    #[serde(default)]
    pub streaming: Option<RouteLimit>,
    /// Health and feature probes
    #[serde(default)]
    pub health: Option<RouteLimit>,
}

/// Request budget for one route class
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteLimit {
    /// Maximum requests per window
    pub requests: u32,
    /// Window duration (e.g. "1m", "30s")
    pub window: String,
}
