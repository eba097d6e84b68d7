use secrecy::SecretString;
use serde::Deserialize;

/// Static API-key authentication for inbound requests
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Whether authentication is enforced
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Accepted API keys (bearer token or `x-api-key` header)
    #[serde(default)]
    pub api_keys: Vec<SecretString>,
    /// Paths exempt from authentication
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

const fn default_enabled() -> bool {
    true
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_owned()]
}
