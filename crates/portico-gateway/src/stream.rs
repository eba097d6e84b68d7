//! Stateful stream chunk transformers and the stream processor that drives
//! an upstream chunk source into framed SSE output

use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::error::GatewayError;
use crate::protocol::azure::{AzureReasoningStatus, AzureStreamChunk, AzureStreamItem};
use crate::protocol::claude::{
    ClaudeContentBlock, ClaudeMessageStart, ClaudeStreamError, ClaudeStreamEvent, ClaudeTextDelta,
};
use crate::protocol::openai::{OpenAiChunkChoice, OpenAiDelta, OpenAiStreamChunk};

/// Upstream chunk source after SSE decoding
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<AzureStreamChunk, GatewayError>> + Send>>;

/// One outbound SSE frame; a named event for the Claude-style shape, bare
/// data for the OpenAI-style shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<&'static str>,
    pub data: String,
}

impl SseFrame {
    fn named(event: &'static str, data: String) -> Self {
        Self {
            event: Some(event),
            data,
        }
    }

    fn data(data: String) -> Self {
        Self { event: None, data }
    }

    fn done() -> Self {
        Self::data("[DONE]".to_owned())
    }

    /// Whether this is the `[DONE]` terminator frame
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.event.is_none() && self.data == "[DONE]"
    }
}

/// Result of transforming one upstream chunk
pub struct TransformStep {
    pub frames: Vec<SseFrame>,
    /// The chunk carried the stream terminator; stop consuming
    pub terminal: bool,
}

/// Per-request stateful transformer from upstream chunks to external frames
pub trait ChunkTransformer: Send {
    /// Transform one upstream chunk into zero or more frames
    fn on_chunk(&mut self, chunk: &AzureStreamChunk) -> TransformStep;

    /// Emit a terminal error event plus stop framing for the target format
    fn on_error(&mut self, message: &str) -> Vec<SseFrame>;
}

// -- Claude-style transformer --

/// Tracks start framing and the open content block for the legacy shape
#[derive(Default)]
pub struct ClaudeChunkTransformer {
    started: bool,
    block_open: bool,
}

impl ClaudeChunkTransformer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(event: &ClaudeStreamEvent) -> SseFrame {
        SseFrame::named(event.event_name(), serde_json::to_string(event).unwrap_or_default())
    }
}

impl ChunkTransformer for ClaudeChunkTransformer {
    fn on_chunk(&mut self, chunk: &AzureStreamChunk) -> TransformStep {
        let mut frames = Vec::new();
        let mut terminal = false;

        if !self.started {
            self.started = true;
            frames.push(Self::frame(&ClaudeStreamEvent::MessageStart {
                message: ClaudeMessageStart {
                    id: chunk.id.clone(),
                    message_type: "message".to_owned(),
                    role: "assistant".to_owned(),
                    content: vec![],
                    model: chunk.model.clone(),
                },
            }));
        }

        for item in &chunk.output {
            match item {
                AzureStreamItem::Text { delta } => {
                    if !self.block_open {
                        self.block_open = true;
                        frames.push(Self::frame(&ClaudeStreamEvent::ContentBlockStart {
                            index: 0,
                            content_block: ClaudeContentBlock::Text { text: String::new() },
                        }));
                    }
                    frames.push(Self::frame(&ClaudeStreamEvent::ContentBlockDelta {
                        index: 0,
                        delta: ClaudeTextDelta {
                            delta_type: "text_delta".to_owned(),
                            text: delta.clone(),
                        },
                    }));
                }
                // Only a completed reasoning item ends the stream
                AzureStreamItem::Reasoning {
                    status: AzureReasoningStatus::Completed,
                    ..
                } => {
                    if self.block_open {
                        self.block_open = false;
                        frames.push(Self::frame(&ClaudeStreamEvent::ContentBlockStop { index: 0 }));
                    }
                    frames.push(Self::frame(&ClaudeStreamEvent::MessageStop));
                    terminal = true;
                    break;
                }
                AzureStreamItem::Reasoning { .. } => {}
            }
        }

        TransformStep { frames, terminal }
    }

    fn on_error(&mut self, message: &str) -> Vec<SseFrame> {
        let mut frames = vec![Self::frame(&ClaudeStreamEvent::Error {
            error: ClaudeStreamError {
                error_type: "streaming_error".to_owned(),
                message: message.to_owned(),
            },
        })];

        if self.block_open {
            self.block_open = false;
            frames.push(Self::frame(&ClaudeStreamEvent::ContentBlockStop { index: 0 }));
        }
        if self.started {
            frames.push(Self::frame(&ClaudeStreamEvent::MessageStop));
        }

        frames
    }
}

// -- OpenAI-style transformer --

/// Tracks start framing and upstream identity for the chat shape
#[derive(Default)]
pub struct OpenAiChunkTransformer {
    started: bool,
    meta: Option<ChunkMeta>,
}

struct ChunkMeta {
    id: String,
    model: String,
    created: u64,
}

impl OpenAiChunkTransformer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn chunk(&self, delta: OpenAiDelta, finish_reason: Option<String>) -> SseFrame {
        let (id, model, created) = self.meta.as_ref().map_or_else(
            || ("chatcmpl-unknown".to_owned(), String::new(), 0),
            |meta| (meta.id.clone(), meta.model.clone(), meta.created),
        );

        let chunk = OpenAiStreamChunk {
            id,
            object: "chat.completion.chunk".to_owned(),
            created,
            model,
            choices: vec![OpenAiChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        };

        SseFrame::data(serde_json::to_string(&chunk).unwrap_or_default())
    }
}

impl ChunkTransformer for OpenAiChunkTransformer {
    fn on_chunk(&mut self, chunk: &AzureStreamChunk) -> TransformStep {
        let mut frames = Vec::new();
        let mut terminal = false;

        if !self.started {
            self.started = true;
            self.meta = Some(ChunkMeta {
                id: chunk.id.clone(),
                model: chunk.model.clone(),
                created: chunk.created,
            });
            frames.push(self.chunk(
                OpenAiDelta {
                    role: Some("assistant".to_owned()),
                    content: None,
                },
                None,
            ));
        }

        for item in &chunk.output {
            match item {
                AzureStreamItem::Text { delta } => {
                    frames.push(self.chunk(
                        OpenAiDelta {
                            role: None,
                            content: Some(delta.clone()),
                        },
                        None,
                    ));
                }
                AzureStreamItem::Reasoning {
                    status: AzureReasoningStatus::Completed,
                    ..
                } => {
                    frames.push(self.chunk(OpenAiDelta::default(), Some("stop".to_owned())));
                    terminal = true;
                    break;
                }
                AzureStreamItem::Reasoning { .. } => {}
            }
        }

        TransformStep { frames, terminal }
    }

    fn on_error(&mut self, message: &str) -> Vec<SseFrame> {
        vec![self.chunk(
            OpenAiDelta {
                role: None,
                content: Some(message.to_owned()),
            },
            Some("error".to_owned()),
        )]
    }
}

// -- Stream processor --

/// Drive an upstream chunk source through a transformer.
///
/// The processor pulls one chunk at a time (client backpressure naturally
/// stalls upstream consumption), stops at the transformer's terminal signal,
/// and enforces `timeout` as a whole-stream deadline independent of the
/// caller's socket. Mid-stream upstream errors become a terminal error event
/// in the target format. Dropping the returned stream aborts the upstream
/// connection.
pub fn process<T>(mut transformer: T, mut upstream: ChunkStream, timeout: Duration) -> ReceiverStream<SseFrame>
where
    T: ChunkTransformer + 'static,
{
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match tokio::time::timeout_at(deadline, upstream.next()).await {
                Err(_) => {
                    warn!("stream deadline exceeded, terminating");
                    for frame in transformer.on_error("request timed out") {
                        if tx.send(frame).await.is_err() {
                            return;
                        }
                    }
                    break;
                }
                // Upstream ended without a terminator; close without stop framing
                Ok(None) => break,
                Ok(Some(Ok(chunk))) => {
                    let step = transformer.on_chunk(&chunk);
                    for frame in step.frames {
                        if tx.send(frame).await.is_err() {
                            return;
                        }
                    }
                    if step.terminal {
                        break;
                    }
                }
                Ok(Some(Err(e))) => {
                    warn!(error = %e, "upstream stream failed mid-flight");
                    let message = portico_core::redact::sanitize(&e.to_string());
                    for frame in transformer.on_error(&message) {
                        if tx.send(frame).await.is_err() {
                            return;
                        }
                    }
                    break;
                }
            }
        }

        let _ = tx.send(SseFrame::done()).await;
    });

    ReceiverStream::new(rx)
}
