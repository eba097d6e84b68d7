use serde::Deserialize;

/// Configuration for extracting client IP addresses
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientIpConfig {
    /// Trust `x-forwarded-for` from this many proxy hops
    #[serde(default)]
    pub trusted_hops: Option<usize>,
}
