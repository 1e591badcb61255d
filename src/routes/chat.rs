// ABOUTME: Chat route handler bridging validated requests onto the SSE stream
// ABOUTME: Opens the backend stream and wires cancellation, translator, and controller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! Chat streaming route
//!
//! `POST /api/chat/stream` takes `{ session_id?, query }` and responds
//! with an SSE stream. Request validation failures are plain JSON errors;
//! everything after headers are written is reported in-stream, ending
//! with exactly one terminal frame.

use crate::errors::AppError;
use crate::server::ServerState;
use crate::sse::emitter::{sse_response_headers, SseEmitter};
use crate::sse::events::EventMeta;
use crate::streaming::cancel::StreamCancellation;
use crate::streaming::controller::stream_bridge;
use crate::streaming::translator::spawn_translator;
use axum::{
    body::Body,
    extract::State,
    response::Response,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures_util::{stream, Stream};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;

/// Fallback frame when even the error event fails to serialize
const SETUP_FAILURE_FRAME: &[u8] =
    b"event: error\ndata: {\"type\":\"error\",\"message\":\"stream setup failed\"}\n\n";

/// Request body for the streaming chat endpoint
#[derive(Debug, Deserialize)]
pub struct ChatStreamRequest {
    /// Session to continue; omitted on the first turn
    #[serde(default)]
    pub session_id: Option<String>,
    /// The user's query
    pub query: String,
}

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(state: Arc<ServerState>) -> Router {
        Router::new()
            .route("/api/chat/stream", post(Self::stream_chat))
            .with_state(state)
    }

    /// Stream one retrieval-augmented answer as SSE
    async fn stream_chat(
        State(state): State<Arc<ServerState>>,
        Json(request): Json<ChatStreamRequest>,
    ) -> Result<Response, AppError> {
        if request.query.trim().is_empty() {
            return Err(AppError::missing_field("query"));
        }
        let client_session = request.session_id.filter(|s| !s.is_empty());

        let feed = match state
            .backend
            .retrieve_and_generate_stream(client_session.as_deref(), &request.query)
            .await
        {
            Ok(feed) => feed,
            Err(err) => {
                // Setup failure: one error frame, no message.start, close.
                warn!(error = %err, "backend call failed before streaming");
                let emitter = SseEmitter::new(EventMeta::for_session(client_session));
                let frame = emitter
                    .error(err.message)
                    .unwrap_or_else(|_| Bytes::from_static(SETUP_FAILURE_FRAME));
                return Ok(sse_response(stream::once(async move { Ok(frame) })));
            }
        };

        // Session id is client-supplied, or backend-assigned on the first
        // response; immutable from here on.
        let session_id =
            client_session.or_else(|| feed.session_id().map(ToOwned::to_owned));
        let emitter = SseEmitter::new(EventMeta::for_session(session_id));

        let (cancellation, guard) =
            StreamCancellation::spawn(state.config.streaming.stream_timeout());
        let events = spawn_translator(feed, cancellation.child_token());
        let body = stream_bridge(
            events,
            cancellation,
            guard,
            emitter,
            state.config.streaming.heartbeat_interval(),
        );

        Ok(sse_response(body))
    }
}

/// Build an SSE response, setting the event-stream headers before any
/// body byte is written
fn sse_response<S>(body: S) -> Response
where
    S: Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    let mut response = Response::new(Body::from_stream(body));
    for (name, value) in sse_response_headers() {
        response.headers_mut().insert(name, value);
    }
    response
}
