// ABOUTME: Outbound SSE event vocabulary for the streaming chat bridge
// ABOUTME: Closed tagged union of message.start/delta/citation/end and error events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # Stream Event Model
//!
//! The normalized vocabulary of events the server sends to chat clients.
//! The set is closed: every event is one of `message.start`,
//! `message.delta`, `message.citation`, `message.end`, or `error`, each
//! with exactly one serialization rule. Events carry optional correlation
//! fields (event id, session id) in [`EventMeta`], applied at construction.
//!
//! Ordering contract for one invocation: at most one `message.start`,
//! preceding all content events; exactly one terminal event
//! (`message.end` or `error`), after which nothing follows.

use serde::{Deserialize, Serialize};

// ============================================================================
// Names and Enumerations
// ============================================================================

/// Wire-level event name, used both as the SSE `event:` field and as the
/// `type` discriminator inside the JSON payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "message.start")]
    MessageStart,
    #[serde(rename = "message.delta")]
    MessageDelta,
    #[serde(rename = "message.citation")]
    MessageCitation,
    #[serde(rename = "message.end")]
    MessageEnd,
    #[serde(rename = "error")]
    Error,
}

impl EventKind {
    /// The SSE event name for this kind
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MessageStart => "message.start",
            Self::MessageDelta => "message.delta",
            Self::MessageCitation => "message.citation",
            Self::MessageEnd => "message.end",
            Self::Error => "error",
        }
    }
}

/// Role of a message participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

/// Closed set of reasons a message stream ended
///
/// `completed` is reserved for the upstream feed closing without error;
/// `error` covers cancellation and backend-failure paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Completed,
    Stop,
    Length,
    ContentFilter,
    Tool,
    GuardrailIntervention,
    Error,
    Unknown,
}

// ============================================================================
// Common Fields
// ============================================================================

/// Optional correlation fields carried by every event
///
/// The session id is immutable once an invocation starts: either the
/// client supplied it, or the backend assigned one on its first response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    /// Opaque event id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Session the invocation belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl EventMeta {
    /// Meta carrying only a session id, when one is known
    #[must_use]
    pub const fn for_session(session_id: Option<String>) -> Self {
        Self {
            id: None,
            session_id,
        }
    }
}

/// Message header sent with `message.start`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub role: Role,
}

/// One retrieved reference inside a `message.citation` event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationReference {
    /// Snippet of the referenced text
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub text: String,
    /// Source locator, e.g. `s3://bucket/key`
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub source: String,
}

// ============================================================================
// Event Payloads
// ============================================================================

/// `message.start` — opens the assistant message, exactly once per stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageStart {
    #[serde(flatten)]
    pub meta: EventMeta,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: MessageHeader,
}

/// `message.delta` — one incremental text chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDelta {
    #[serde(flatten)]
    pub meta: EventMeta,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub delta: String,
}

/// `message.citation` — retrieved references backing the generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCitation {
    #[serde(flatten)]
    pub meta: EventMeta,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub refs: Vec<CitationReference>,
}

/// `message.end` — terminal event with a finish reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnd {
    #[serde(flatten)]
    pub meta: EventMeta,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub finish_reason: FinishReason,
    /// Diagnostic text for non-`completed` endings, e.g. the cancellation cause
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

/// `error` — terminal event substituting for `message.end` when the
/// stream cannot complete normally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    #[serde(flatten)]
    pub meta: EventMeta,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

// ============================================================================
// Tagged Union
// ============================================================================

/// A normalized outbound stream event
///
/// Owned by the channel that carries it until the emitter frames it;
/// discarded after framing.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    MessageStart(MessageStart),
    MessageDelta(MessageDelta),
    MessageCitation(MessageCitation),
    MessageEnd(MessageEnd),
    Error(ErrorEvent),
}

impl StreamEvent {
    /// Create a `message.start` event
    #[must_use]
    pub const fn message_start(role: Role, meta: EventMeta) -> Self {
        Self::MessageStart(MessageStart {
            meta,
            kind: EventKind::MessageStart,
            message: MessageHeader { role },
        })
    }

    /// Create a `message.delta` event
    #[must_use]
    pub const fn delta(text: String, meta: EventMeta) -> Self {
        Self::MessageDelta(MessageDelta {
            meta,
            kind: EventKind::MessageDelta,
            delta: text,
        })
    }

    /// Create a `message.citation` event
    #[must_use]
    pub const fn citation(refs: Vec<CitationReference>, meta: EventMeta) -> Self {
        Self::MessageCitation(MessageCitation {
            meta,
            kind: EventKind::MessageCitation,
            refs,
        })
    }

    /// Create a `message.end` event
    #[must_use]
    pub const fn message_end(finish_reason: FinishReason, meta: EventMeta) -> Self {
        Self::MessageEnd(MessageEnd {
            meta,
            kind: EventKind::MessageEnd,
            finish_reason,
            detail: None,
        })
    }

    /// Create a `message.end` event carrying diagnostic text
    #[must_use]
    pub fn message_end_detailed(
        finish_reason: FinishReason,
        detail: impl Into<String>,
        meta: EventMeta,
    ) -> Self {
        Self::MessageEnd(MessageEnd {
            meta,
            kind: EventKind::MessageEnd,
            finish_reason,
            detail: Some(detail.into()),
        })
    }

    /// Create an `error` event
    #[must_use]
    pub const fn error(message: String, meta: EventMeta) -> Self {
        Self::Error(ErrorEvent {
            meta,
            kind: EventKind::Error,
            message,
            code: None,
            retryable: None,
        })
    }

    /// Mutable access to the correlation fields
    pub fn meta_mut(&mut self) -> &mut EventMeta {
        match self {
            Self::MessageStart(e) => &mut e.meta,
            Self::MessageDelta(e) => &mut e.meta,
            Self::MessageCitation(e) => &mut e.meta,
            Self::MessageEnd(e) => &mut e.meta,
            Self::Error(e) => &mut e.meta,
        }
    }

    /// The kind tag of this event
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::MessageStart(_) => EventKind::MessageStart,
            Self::MessageDelta(_) => EventKind::MessageDelta,
            Self::MessageCitation(_) => EventKind::MessageCitation,
            Self::MessageEnd(_) => EventKind::MessageEnd,
            Self::Error(_) => EventKind::Error,
        }
    }

    /// The SSE event name for this event
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Whether this event ends the stream
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::MessageEnd(_) | Self::Error(_))
    }
}
