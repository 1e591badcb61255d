// ABOUTME: Controller loop multiplexing cancellation, translated events, and heartbeats
// ABOUTME: Drives the SSE response body with exactly one terminal frame per invocation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # Stream Controller
//!
//! The task that owns the HTTP response body. Each loop iteration is a
//! single biased `select!` over exactly three sources — cancellation-done,
//! the next translated event (or channel close), and the heartbeat tick —
//! so the earliest-ready source wins and nothing is ever polled.
//!
//! State machine: `AwaitingFirstContent → Streaming → Terminated`.
//! `message.start` is emitted lazily before the first content event;
//! exactly one terminal frame is emitted, chosen by which source ended the
//! stream:
//!
//! - channel closed cleanly → `message.end{completed}`
//! - translator reported a feed error → `error`
//! - cancellation fired → `message.end{error}` with the cause as detail
//!
//! On cancellation, remaining buffered events are abandoned; the
//! translator releases the feed on its own exit path.

use crate::errors::AppResult;
use crate::sse::emitter::SseEmitter;
use crate::sse::events::{FinishReason, Role, StreamEvent};
use crate::streaming::cancel::{DisconnectGuard, StreamCancellation};
use async_stream::stream;
use bytes::Bytes;
use futures_util::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Drive one invocation's SSE body from the translated event channel
///
/// The returned stream yields wire frames; the transport writes and
/// flushes each yielded chunk immediately. The [`DisconnectGuard`] is
/// owned by the stream so that hyper dropping the body signals client
/// disconnect to the cancellation merger.
pub fn stream_bridge(
    mut events: mpsc::Receiver<AppResult<StreamEvent>>,
    cancellation: StreamCancellation,
    guard: DisconnectGuard,
    emitter: SseEmitter,
    heartbeat: Duration,
) -> impl Stream<Item = Result<Bytes, Infallible>> {
    stream! {
        // Dropped with the stream; its drop is the disconnect signal.
        let _guard = guard;

        // First tick one full period after stream open.
        let mut heartbeats = interval_at(Instant::now() + heartbeat, heartbeat);
        heartbeats.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut started = false;

        loop {
            tokio::select! {
                biased;
                () = cancellation.cancelled() => {
                    let cause = cancellation
                        .cause()
                        .map_or("cancelled", |c| c.as_str());
                    info!(%cause, "stream cancelled before completion");
                    // Best-effort: on client disconnect the transport is
                    // already gone and the frame is never delivered.
                    if let Ok(frame) =
                        emitter.message_end_detailed(FinishReason::Error, cause)
                    {
                        yield Ok(frame);
                    }
                    break;
                }
                item = events.recv() => match item {
                    Some(Ok(event)) => {
                        if !started {
                            match emitter.message_start(Role::Assistant) {
                                Ok(frame) => {
                                    yield Ok(frame);
                                    started = true;
                                }
                                Err(err) => {
                                    warn!(error = %err, "failed to frame message.start");
                                }
                            }
                        }
                        match emitter.event(event) {
                            Ok(frame) => yield Ok(frame),
                            Err(err) => {
                                warn!(error = %err, "failed to frame stream event");
                            }
                        }
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "backend feed failed mid-stream");
                        if let Ok(frame) = emitter.error(err.message) {
                            yield Ok(frame);
                        }
                        break;
                    }
                    None => {
                        debug!("translated event channel closed, completing");
                        if let Ok(frame) = emitter.message_end(FinishReason::Completed) {
                            yield Ok(frame);
                        }
                        break;
                    }
                },
                _ = heartbeats.tick() => {
                    yield Ok(SseEmitter::heartbeat());
                }
            }
        }
    }
}
