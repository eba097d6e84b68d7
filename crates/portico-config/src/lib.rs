#![allow(clippy::must_use_candidate)]

pub mod auth;
pub mod client_ip;
mod env;
pub mod health;
mod loader;
pub mod rate_limit;
pub mod resilience;
pub mod server;
pub mod telemetry;
pub mod upstream;

use serde::Deserialize;

pub use auth::*;
pub use client_ip::*;
pub use health::*;
pub use rate_limit::*;
pub use resilience::*;
pub use server::*;
pub use telemetry::{LogFormat, TelemetryConfig};
pub use upstream::*;

/// Top-level Portico configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream provider configuration
    pub upstream: UpstreamConfig,
    /// Resilience configuration (circuit breaker, degradation, retries)
    #[serde(default)]
    pub resilience: ResilienceConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
