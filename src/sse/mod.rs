// ABOUTME: Server-Sent Events support for the streaming chat bridge
// ABOUTME: Event vocabulary plus wire framing and heartbeat emission
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # Server-Sent Events
//!
//! The outbound protocol surface: the normalized event vocabulary
//! ([`events`]) and the wire-level framing that turns events into flushed
//! SSE frames ([`emitter`]).

/// SSE wire framing and response headers
pub mod emitter;

/// Normalized stream event vocabulary
pub mod events;

pub use emitter::{sse_response_headers, SseEmitter};
pub use events::{
    CitationReference, EventKind, EventMeta, FinishReason, Role, StreamEvent,
};
