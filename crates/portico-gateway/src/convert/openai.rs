//! Response direction: upstream shape -> OpenAI-style chat shape

use crate::error::GatewayError;
use crate::protocol::azure::{AzureOutputItem, AzureResponse, AzureUsage};
use crate::protocol::openai::{OpenAiAssistantMessage, OpenAiChatResponse, OpenAiChoice, OpenAiUsage};

/// Map a non-streaming upstream response to the chat shape.
///
/// # Errors
///
/// Returns `GatewayError::Transform` when the upstream output contains no
/// text content
pub fn to_openai_response(response: &AzureResponse) -> Result<OpenAiChatResponse, GatewayError> {
    let text: Vec<&str> = response
        .output
        .iter()
        .filter_map(|item| match item {
            AzureOutputItem::Text { text } => Some(text.as_str()),
            AzureOutputItem::Reasoning { .. } => None,
        })
        .collect();

    if text.is_empty() {
        return Err(GatewayError::Transform(format!(
            "upstream response {} contained no text output",
            response.id
        )));
    }

    Ok(OpenAiChatResponse {
        id: response.id.clone(),
        object: "chat.completion".to_owned(),
        created: response.created,
        model: response.model.clone(),
        choices: vec![OpenAiChoice {
            index: 0,
            message: OpenAiAssistantMessage {
                role: "assistant".to_owned(),
                content: text.join(""),
            },
            finish_reason: Some("stop".to_owned()),
        }],
        usage: response.usage.as_ref().map(map_usage),
    })
}

fn map_usage(usage: &AzureUsage) -> OpenAiUsage {
    OpenAiUsage {
        prompt_tokens: usage.input_tokens,
        completion_tokens: usage.output_tokens,
        total_tokens: usage.total_tokens,
    }
}
