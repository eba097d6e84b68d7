//! Claude-style legacy completion wire format types

use serde::{Deserialize, Serialize};

// -- Request types --

/// Legacy completion request (`prompt`-shaped)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeCompletionRequest {
    /// Model identifier
    pub model: String,
    /// Prompt text, sent as a single user message upstream
    pub prompt: String,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

// -- Response types --

/// Non-streaming response in the legacy shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeResponse {
    /// Response identifier
    pub id: String,
    /// Object type (always "message")
    #[serde(rename = "type")]
    pub response_type: String,
    /// Role (always "assistant")
    pub role: String,
    /// Response content blocks
    pub content: Vec<ClaudeContentBlock>,
    /// Model used
    pub model: String,
    /// Stop reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ClaudeUsage>,
}

/// Content block in a response or stream event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeContentBlock {
    /// Text content
    Text {
        /// The text string
        text: String,
    },
}

/// Token usage; fields absent upstream are omitted, never zeroed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
}

// -- Streaming types --

/// Stream events in the legacy shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeStreamEvent {
    /// First event of every stream
    MessageStart { message: ClaudeMessageStart },
    /// A content block is opening
    ContentBlockStart {
        index: usize,
        content_block: ClaudeContentBlock,
    },
    /// Incremental text for an open block
    ContentBlockDelta { index: usize, delta: ClaudeTextDelta },
    /// A content block is closed
    ContentBlockStop { index: usize },
    /// Final event of a completed stream
    MessageStop,
    /// Terminal error, always followed by stop framing
    Error { error: ClaudeStreamError },
}

impl ClaudeStreamEvent {
    /// SSE event name for this stream event
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::MessageStart { .. } => "message_start",
            Self::ContentBlockStart { .. } => "content_block_start",
            Self::ContentBlockDelta { .. } => "content_block_delta",
            Self::ContentBlockStop { .. } => "content_block_stop",
            Self::MessageStop => "message_stop",
            Self::Error { .. } => "error",
        }
    }
}

/// Payload of `message_start`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeMessageStart {
    /// Upstream response identifier
    pub id: String,
    /// Object type (always "message")
    #[serde(rename = "type")]
    pub message_type: String,
    /// Role (always "assistant")
    pub role: String,
    /// Initially empty content
    pub content: Vec<ClaudeContentBlock>,
    /// Model producing the stream
    pub model: String,
}

/// Incremental text delta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeTextDelta {
    /// Delta type (always "text_delta")
    #[serde(rename = "type")]
    pub delta_type: String,
    /// The incremental text
    pub text: String,
}

/// Error payload inside an `error` stream event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeStreamError {
    /// Error kind
    #[serde(rename = "type")]
    pub error_type: String,
    /// Sanitized message
    pub message: String,
}
