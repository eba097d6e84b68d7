//! Format detection, structural validation, and text sanitization for
//! inbound request bodies

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::GatewayError;
use crate::protocol::ExternalRequest;
use crate::protocol::claude::ClaudeCompletionRequest;
use crate::protocol::openai::{OpenAiChatRequest, OpenAiContent, OpenAiContentPart};

/// Maximum bytes per text field
pub const MAX_TEXT_BYTES: usize = 8 * 1024 * 1024;
/// Maximum messages per chat request
pub const MAX_MESSAGES: usize = 100;
/// Maximum nesting depth anywhere in the body
pub const MAX_DEPTH: usize = 10;
/// Maximum array length anywhere in the body
pub const MAX_ARRAY_LEN: usize = 1000;

/// `<script>` blocks and stray script tags
static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>|</?script\b[^>]*>").expect("valid regex"));

/// `javascript:` and `data:` URI schemes
static DANGEROUS_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(?:javascript|data):[^\s"'<>]*"#).expect("valid regex"));

/// Inline event-handler attributes (`onclick=`, `onerror=`, ...)
static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bon\w+\s*=").expect("valid regex"));

/// Template-injection markers
static TEMPLATE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{.*?\}\}|\$\{.*?\}").expect("valid regex"));

/// Classify an untyped body as one of the two external shapes and validate
/// it structurally.
///
/// Detection is by presence of a `messages` array versus a `prompt` string;
/// a body with both or neither is rejected. Text fields in the returned
/// request are sanitized of control characters and known injection patterns.
///
/// # Errors
///
/// Returns `GatewayError::Validation` naming the offending field. Never
/// fails for downstream or network reasons.
pub fn detect_and_validate(body: &Value) -> Result<ExternalRequest, GatewayError> {
    let Some(object) = body.as_object() else {
        return Err(invalid("body", "request body must be a JSON object"));
    };

    check_structure(body, 0, "body")?;

    let has_messages = object.contains_key("messages");
    let has_prompt = object.contains_key("prompt");

    match (has_messages, has_prompt) {
        (true, true) => Err(invalid("body", "request must contain exactly one of 'prompt' or 'messages'")),
        (false, false) => Err(invalid("body", "request must contain either 'prompt' or 'messages'")),
        (true, false) => validate_chat(body),
        (false, true) => validate_legacy(body),
    }
}

fn validate_legacy(body: &Value) -> Result<ExternalRequest, GatewayError> {
    if !body["prompt"].is_string() {
        return Err(invalid_with_excerpt("prompt", "must be a string", &body["prompt"]));
    }

    let mut request: ClaudeCompletionRequest =
        serde_json::from_value(body.clone()).map_err(|e| invalid("body", &e.to_string()))?;

    check_text_len("prompt", &request.prompt)?;
    request.prompt = sanitize_text(&request.prompt);

    Ok(ExternalRequest::LegacyCompletion(request))
}

fn validate_chat(body: &Value) -> Result<ExternalRequest, GatewayError> {
    if !body["messages"].is_array() {
        return Err(invalid_with_excerpt("messages", "must be an array", &body["messages"]));
    }

    let mut request: OpenAiChatRequest =
        serde_json::from_value(body.clone()).map_err(|e| invalid("body", &e.to_string()))?;

    if request.messages.len() > MAX_MESSAGES {
        return Err(invalid(
            "messages",
            &format!("at most {MAX_MESSAGES} messages allowed, got {}", request.messages.len()),
        ));
    }

    for (i, message) in request.messages.iter_mut().enumerate() {
        match &mut message.content {
            OpenAiContent::Text(text) => {
                check_text_len(&format!("messages[{i}].content"), text)?;
                *text = sanitize_text(text);
            }
            OpenAiContent::Parts(parts) => {
                for part in parts {
                    let OpenAiContentPart::Text { text } = part;
                    check_text_len(&format!("messages[{i}].content"), text)?;
                    *text = sanitize_text(text);
                }
            }
        }
    }

    Ok(ExternalRequest::ChatCompletion(request))
}

/// Enforce nesting depth and array length bounds anywhere in the body
fn check_structure(value: &Value, depth: usize, field: &str) -> Result<(), GatewayError> {
    if depth > MAX_DEPTH {
        return Err(invalid(field, &format!("nesting depth exceeds {MAX_DEPTH}")));
    }

    match value {
        Value::Array(items) => {
            if items.len() > MAX_ARRAY_LEN {
                return Err(invalid(field, &format!("array length exceeds {MAX_ARRAY_LEN}")));
            }
            for item in items {
                check_structure(item, depth + 1, field)?;
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                check_structure(item, depth + 1, key)?;
            }
        }
        _ => {}
    }

    Ok(())
}

fn check_text_len(field: &str, text: &str) -> Result<(), GatewayError> {
    if text.len() > MAX_TEXT_BYTES {
        return Err(invalid(field, &format!("text exceeds {MAX_TEXT_BYTES} bytes")));
    }
    Ok(())
}

/// Strip control characters and neutralize known injection patterns
#[must_use]
pub fn sanitize_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect();

    let cleaned = SCRIPT_TAG.replace_all(&cleaned, "");
    let cleaned = DANGEROUS_URI.replace_all(&cleaned, "");
    let cleaned = EVENT_HANDLER.replace_all(&cleaned, "");
    TEMPLATE_MARKER.replace_all(&cleaned, "").into_owned()
}

fn invalid(field: &str, message: &str) -> GatewayError {
    GatewayError::Validation {
        field: field.to_owned(),
        message: message.to_owned(),
    }
}

/// Validation error with a short, truncated excerpt of the offending value
fn invalid_with_excerpt(field: &str, message: &str, value: &Value) -> GatewayError {
    let mut excerpt = value.to_string();
    if excerpt.len() > 40 {
        excerpt.truncate(40);
        excerpt.push('…');
    }
    GatewayError::Validation {
        field: field.to_owned(),
        message: format!("{message} (got {excerpt})"),
    }
}
