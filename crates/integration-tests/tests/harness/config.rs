//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use portico_config::{
    AuthConfig, CircuitBreakerConfig, Config, HealthConfig, RateLimitConfig, ResilienceConfig,
    ServerConfig, UpstreamConfig,
};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder pointed at a mock upstream base URL
    pub fn new(upstream_base: &str) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig::default(),
                    auth: None,
                    rate_limit: None,
                    client_ip: None,
                },
                upstream: UpstreamConfig {
                    endpoint: upstream_base.parse().expect("valid URL"),
                    api_key: SecretString::from("test-key"),
                    api_version: "preview".to_owned(),
                    request_timeout_secs: 5,
                    name: "azure-responses".to_owned(),
                },
                resilience: ResilienceConfig {
                    // High threshold so tests opt in to breaker behavior
                    circuit_breaker: CircuitBreakerConfig {
                        failure_threshold: 50,
                        ..CircuitBreakerConfig::default()
                    },
                    ..ResilienceConfig::default()
                },
                telemetry: None,
            },
        }
    }

    /// Enable API-key authentication with the given accepted keys
    pub fn with_auth(mut self, keys: &[&str]) -> Self {
        self.config.server.auth = Some(AuthConfig {
            enabled: true,
            api_keys: keys.iter().map(|&k| SecretString::from(k)).collect(),
            public_paths: vec!["/health".to_owned()],
        });
        self
    }

    /// Set rate limit configuration
    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.config.server.rate_limit = Some(config);
        self
    }

    /// Set circuit breaker thresholds
    pub fn with_circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.config.resilience.circuit_breaker = config;
        self
    }

    /// Set total upstream attempts per request
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.config.resilience.max_attempts = attempts;
        self
    }

    /// Disable fallback strategies and service level management
    pub fn without_degradation(mut self) -> Self {
        self.config.resilience.degradation.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
