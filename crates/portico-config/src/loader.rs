use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if resilience thresholds are out of range or any
    /// rate-limit window fails to parse
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_resilience()?;
        self.validate_rate_limits()?;
        Ok(())
    }

    fn validate_resilience(&self) -> anyhow::Result<()> {
        let breaker = &self.resilience.circuit_breaker;
        if breaker.failure_threshold == 0 {
            anyhow::bail!("resilience.circuit_breaker.failure_threshold must be greater than 0");
        }
        if breaker.window_seconds == 0 || breaker.cooldown_seconds == 0 {
            anyhow::bail!("resilience.circuit_breaker windows must be greater than 0");
        }
        if breaker.max_cooldown_seconds < breaker.cooldown_seconds {
            anyhow::bail!("resilience.circuit_breaker.max_cooldown_seconds must not be below cooldown_seconds");
        }
        if self.resilience.max_attempts == 0 {
            anyhow::bail!("resilience.max_attempts must be at least 1");
        }
        Ok(())
    }

    fn validate_rate_limits(&self) -> anyhow::Result<()> {
        let Some(ref rate_limit) = self.server.rate_limit else {
            return Ok(());
        };

        let classes = [
            ("global", &rate_limit.global),
            ("auth", &rate_limit.auth),
            ("completions", &rate_limit.completions),
            ("streaming", &rate_limit.streaming),
            ("health", &rate_limit.health),
        ];

        for (name, limit) in classes {
            if let Some(limit) = limit {
                if limit.requests == 0 {
                    anyhow::bail!("rate_limit.{name}.requests must be greater than 0");
                }
                duration_str::parse(&limit.window)
                    .map_err(|e| anyhow::anyhow!("invalid rate_limit.{name}.window '{}': {e}", limit.window))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
            [upstream]
            endpoint = "https://example.openai.azure.com"
            api_key = "test-key"
        "#
    }

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config: Config = toml::from_str(minimal_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.upstream.api_version, "preview");
        assert_eq!(config.resilience.circuit_breaker.failure_threshold, 5);
        assert!(config.resilience.degradation.enabled);
    }

    #[test]
    fn zero_failure_threshold_is_rejected() {
        let toml = format!(
            "{}\n[resilience.circuit_breaker]\nfailure_threshold = 0",
            minimal_toml()
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_rate_limit_window_is_rejected() {
        let toml = format!(
            "{}\n[server.rate_limit.completions]\nrequests = 10\nwindow = \"not-a-duration\"",
            minimal_toml()
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let toml = format!("{}\nunexpected = true", minimal_toml());
        assert!(toml::from_str::<Config>(&toml).is_err());
    }
}
