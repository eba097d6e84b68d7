//! Wire format types for the two external shapes and the upstream provider

pub mod azure;
pub mod claude;
pub mod openai;

use claude::ClaudeCompletionRequest;
use openai::OpenAiChatRequest;

/// A validated inbound request in one of the two external shapes
#[derive(Debug, Clone)]
pub enum ExternalRequest {
    /// `prompt`-shaped legacy completion; responses use the Claude-style shape
    LegacyCompletion(ClaudeCompletionRequest),
    /// `messages`-shaped chat completion; responses use the OpenAI-style shape
    ChatCompletion(OpenAiChatRequest),
}

impl ExternalRequest {
    /// Requested model identifier
    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            Self::LegacyCompletion(req) => &req.model,
            Self::ChatCompletion(req) => &req.model,
        }
    }

    /// Whether the caller requested a streamed response
    #[must_use]
    pub fn stream(&self) -> bool {
        match self {
            Self::LegacyCompletion(req) => req.stream.unwrap_or(false),
            Self::ChatCompletion(req) => req.stream.unwrap_or(false),
        }
    }
}
