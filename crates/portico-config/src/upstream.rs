use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Configuration for the backing Responses-style provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: Url,
    /// API key sent in the `api-key` header
    pub api_key: SecretString,
    /// API version query parameter
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Per-request timeout in seconds, covering streaming lifetimes too
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Dependency name used by the circuit breaker and health output
    #[serde(default = "default_dependency_name")]
    pub name: String,
}

fn default_api_version() -> String {
    "preview".to_owned()
}

const fn default_request_timeout() -> u64 {
    120
}

fn default_dependency_name() -> String {
    "azure-responses".to_owned()
}
