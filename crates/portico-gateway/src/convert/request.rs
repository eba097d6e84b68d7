//! Request direction: external shapes -> upstream shape

use uuid::Uuid;

use crate::protocol::ExternalRequest;
use crate::protocol::azure::{AzureMessage, AzureRequest};
use crate::protocol::openai::{OpenAiContent, OpenAiContentPart, OpenAiStop};

/// Build the upstream request for an external request.
///
/// Optional sampling fields are copied only when the caller supplied them,
/// so the upstream provider's own defaults apply otherwise. A fresh trace
/// id is attached per call.
#[must_use]
pub fn to_upstream(request: &ExternalRequest) -> AzureRequest {
    match request {
        ExternalRequest::LegacyCompletion(req) => AzureRequest {
            model: req.model.clone(),
            messages: vec![AzureMessage {
                role: "user".to_owned(),
                content: req.prompt.clone(),
            }],
            max_completion_tokens: req.max_tokens,
            temperature: req.temperature,
            top_p: req.top_p,
            stop: req.stop_sequences.clone(),
            stream: req.stream,
            trace_id: new_trace_id(),
        },
        ExternalRequest::ChatCompletion(req) => AzureRequest {
            model: req.model.clone(),
            messages: req
                .messages
                .iter()
                .map(|msg| AzureMessage {
                    role: msg.role.clone(),
                    content: flatten_content(&msg.content),
                })
                .collect(),
            max_completion_tokens: req.max_tokens,
            temperature: req.temperature,
            top_p: req.top_p,
            stop: req.stop.as_ref().map(OpenAiStop::to_vec),
            stream: req.stream,
            trace_id: new_trace_id(),
        },
    }
}

/// Flatten array-of-blocks content to a newline-joined string
fn flatten_content(content: &OpenAiContent) -> String {
    match content {
        OpenAiContent::Text(text) => text.clone(),
        OpenAiContent::Parts(parts) => parts
            .iter()
            .map(|OpenAiContentPart::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn new_trace_id() -> String {
    format!("trace-{}", Uuid::new_v4().simple())
}
