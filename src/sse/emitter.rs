// ABOUTME: Wire-level SSE framing for stream events and heartbeat comments
// ABOUTME: Produces one flushed frame per event plus the unbuffered-stream response headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # SSE Protocol Emitter
//!
//! Frames [`StreamEvent`]s as wire-level Server-Sent Events:
//!
//! ```text
//! event: message.delta
//! data: {"type":"message.delta","delta":"Hello"}
//!
//! ```
//!
//! Each frame is produced as one [`Bytes`] chunk and yielded as one body
//! chunk, so the transport writes and flushes it immediately — clients see
//! deltas as they arrive, never after buffer-fill. Heartbeats are comment
//! lines (`:ping`), protocol-level filler that carries no event.

use crate::errors::AppResult;
use crate::sse::events::{
    CitationReference, EventMeta, FinishReason, Role, StreamEvent,
};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use serde::Serialize;

/// Comment text used for heartbeat frames
const HEARTBEAT_TEXT: &str = "ping";

/// Response headers required before the first body byte of an event stream
///
/// Declares the event-stream content type and disables intermediary
/// buffering (`X-Accel-Buffering` covers nginx-style proxies).
#[must_use]
pub fn sse_response_headers() -> [(HeaderName, HeaderValue); 4] {
    [
        (CONTENT_TYPE, HeaderValue::from_static("text/event-stream")),
        (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        (CONNECTION, HeaderValue::from_static("keep-alive")),
        (
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        ),
    ]
}

/// Frames stream events for one invocation, stamping each with the
/// invocation's correlation fields
#[derive(Debug, Clone, Default)]
pub struct SseEmitter {
    meta: EventMeta,
}

impl SseEmitter {
    /// Create an emitter stamping `meta` onto every framed event
    #[must_use]
    pub const fn new(meta: EventMeta) -> Self {
        Self { meta }
    }

    /// Frame a `message.start` event
    ///
    /// # Errors
    /// Returns an error if the payload fails to serialize.
    pub fn message_start(&self, role: Role) -> AppResult<Bytes> {
        self.event(StreamEvent::message_start(role, EventMeta::default()))
    }

    /// Frame a `message.delta` event
    ///
    /// # Errors
    /// Returns an error if the payload fails to serialize.
    pub fn message_delta(&self, text: String) -> AppResult<Bytes> {
        self.event(StreamEvent::delta(text, EventMeta::default()))
    }

    /// Frame a `message.citation` event
    ///
    /// # Errors
    /// Returns an error if the payload fails to serialize.
    pub fn message_citation(&self, refs: Vec<CitationReference>) -> AppResult<Bytes> {
        self.event(StreamEvent::citation(refs, EventMeta::default()))
    }

    /// Frame a `message.end` event
    ///
    /// # Errors
    /// Returns an error if the payload fails to serialize.
    pub fn message_end(&self, reason: FinishReason) -> AppResult<Bytes> {
        self.event(StreamEvent::message_end(reason, EventMeta::default()))
    }

    /// Frame a `message.end` event carrying diagnostic text
    ///
    /// # Errors
    /// Returns an error if the payload fails to serialize.
    pub fn message_end_detailed(
        &self,
        reason: FinishReason,
        detail: impl Into<String>,
    ) -> AppResult<Bytes> {
        self.event(StreamEvent::message_end_detailed(
            reason,
            detail,
            EventMeta::default(),
        ))
    }

    /// Frame an `error` event
    ///
    /// # Errors
    /// Returns an error if the payload fails to serialize.
    pub fn error(&self, message: String) -> AppResult<Bytes> {
        self.event(StreamEvent::error(message, EventMeta::default()))
    }

    /// Frame any normalized event, filling in absent correlation fields
    /// from this emitter's invocation meta
    ///
    /// # Errors
    /// Returns an error if the payload fails to serialize.
    pub fn event(&self, mut event: StreamEvent) -> AppResult<Bytes> {
        let meta = event.meta_mut();
        if meta.id.is_none() {
            meta.id.clone_from(&self.meta.id);
        }
        if meta.session_id.is_none() {
            meta.session_id.clone_from(&self.meta.session_id);
        }
        self.named(event.name(), &event)
    }

    /// Frame a named event with an arbitrary JSON payload
    ///
    /// # Errors
    /// Returns an error if the payload fails to serialize.
    pub fn named<T: Serialize>(&self, name: &str, payload: &T) -> AppResult<Bytes> {
        let data = serde_json::to_string(payload)?;
        let mut frame = String::with_capacity(name.len() + data.len() + 16);
        frame.push_str("event: ");
        frame.push_str(name);
        frame.push('\n');
        frame.push_str("data: ");
        frame.push_str(&data);
        frame.push_str("\n\n");
        Ok(Bytes::from(frame))
    }

    /// Frame an SSE comment line, invisible to event listeners
    #[must_use]
    pub fn comment(text: &str) -> Bytes {
        Bytes::from(format!(":{text}\n\n"))
    }

    /// Frame the periodic heartbeat comment
    #[must_use]
    pub fn heartbeat() -> Bytes {
        Self::comment(HEARTBEAT_TEXT)
    }
}
