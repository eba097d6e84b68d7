//! Azure Responses API wire format types (the upstream provider)

use serde::{Deserialize, Serialize};

// -- Request types --

/// Upstream request, built fresh per call and discarded after it completes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureRequest {
    /// Model deployment identifier
    pub model: String,
    /// Flattened conversation messages
    pub messages: Vec<AzureMessage>,
    /// Maximum tokens; only serialized when the caller supplied it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Per-call tracking identifier
    pub trace_id: String,
}

/// One upstream message; content is always a plain string
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureMessage {
    pub role: String,
    pub content: String,
}

// -- Response types --

/// Non-streaming upstream response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureResponse {
    /// Response identifier
    pub id: String,
    /// Object type (e.g. "response")
    pub object: String,
    /// Unix timestamp
    pub created: u64,
    /// Model that produced the response
    pub model: String,
    /// Ordered output items
    pub output: Vec<AzureOutputItem>,
    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<AzureUsage>,
}

/// Output item in a non-streaming response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AzureOutputItem {
    /// Completed text content
    Text {
        /// The full text
        text: String,
    },
    /// Reasoning progress marker
    Reasoning {
        status: AzureReasoningStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
}

/// Token usage reported by the upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

// -- Streaming types --

/// One upstream stream chunk; all fields are required and a chunk missing
/// any of them is skipped as malformed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureStreamChunk {
    /// Response identifier, stable across one logical response
    pub id: String,
    /// Object type tag
    pub object: String,
    /// Unix timestamp
    pub created: u64,
    /// Model producing the stream
    pub model: String,
    /// Ordered output items in this chunk
    pub output: Vec<AzureStreamItem>,
}

/// Output item inside a stream chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AzureStreamItem {
    /// Incremental text
    Text {
        /// The delta text
        delta: String,
    },
    /// Reasoning progress; `completed` is the sole stream terminator
    Reasoning {
        status: AzureReasoningStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
}

/// Reasoning item status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AzureReasoningStatus {
    InProgress,
    Completed,
}
