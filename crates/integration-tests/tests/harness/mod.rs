//! Shared test harness: mock upstream, config builder, and server wrapper
//!
//! Each integration test binary pulls in the whole harness; not every
//! binary uses every helper.
#![allow(dead_code)]

pub mod config;
pub mod mock_upstream;
pub mod server;

/// One decoded server-sent event
#[derive(Debug)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Parse a buffered SSE body into events, ignoring comment lines
pub fn parse_sse(body: &str) -> Vec<SseEvent> {
    let mut events = Vec::new();
    let mut event: Option<String> = None;
    let mut data: Vec<String> = Vec::new();

    for line in body.lines() {
        if line.is_empty() {
            if !data.is_empty() {
                events.push(SseEvent {
                    event: event.take(),
                    data: data.join("\n"),
                });
                data.clear();
            }
            event = None;
        } else if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim().to_owned());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data.push(rest.trim_start().to_owned());
        }
    }

    if !data.is_empty() {
        events.push(SseEvent {
            event,
            data: data.join("\n"),
        });
    }

    events
}
