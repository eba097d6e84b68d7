//! Response direction: upstream shape -> Claude-style legacy shape

use crate::error::GatewayError;
use crate::protocol::azure::{AzureOutputItem, AzureResponse, AzureUsage};
use crate::protocol::claude::{ClaudeContentBlock, ClaudeResponse, ClaudeUsage};

/// Map a non-streaming upstream response to the legacy shape.
///
/// # Errors
///
/// Returns `GatewayError::Transform` when the upstream output contains no
/// text content; output is never silently dropped
pub fn to_claude_response(response: &AzureResponse) -> Result<ClaudeResponse, GatewayError> {
    let content: Vec<ClaudeContentBlock> = response
        .output
        .iter()
        .filter_map(|item| match item {
            AzureOutputItem::Text { text } => Some(ClaudeContentBlock::Text { text: text.clone() }),
            AzureOutputItem::Reasoning { .. } => None,
        })
        .collect();

    if content.is_empty() {
        return Err(GatewayError::Transform(format!(
            "upstream response {} contained no text output",
            response.id
        )));
    }

    Ok(ClaudeResponse {
        id: response.id.clone(),
        response_type: "message".to_owned(),
        role: "assistant".to_owned(),
        content,
        model: response.model.clone(),
        stop_reason: Some("end_turn".to_owned()),
        usage: response.usage.as_ref().map(map_usage),
    })
}

fn map_usage(usage: &AzureUsage) -> ClaudeUsage {
    ClaudeUsage {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
    }
}
