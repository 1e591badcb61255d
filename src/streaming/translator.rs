// ABOUTME: Translator task draining the backend feed onto the handoff channel
// ABOUTME: Maps feed variants to stream events and guarantees release plus single close
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # Upstream Event Translator
//!
//! One task per invocation drains the backend [`GenerationFeed`] and
//! publishes normalized events on a bounded single-producer channel.
//! The translator never decides the terminal event: it signals normal
//! completion by closing the channel (dropping its sender), and reports a
//! mid-stream feed failure as one `Err` item before closing.
//!
//! The feed handle is released on every exit path — drain, feed error,
//! cancellation, or the controller abandoning the channel — before the
//! channel closes, so upstream resources never outlive the invocation
//! regardless of which side stops first.

use crate::bedrock::feed::{FeedEvent, GenerationFeed};
use crate::errors::AppResult;
use crate::sse::events::{CitationReference, EventMeta, StreamEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bound on translated events awaiting the controller
const EVENT_BUFFER: usize = 16;

/// Spawn the translator task for one open feed
///
/// Returns the receiving half of the handoff channel. The channel closes
/// exactly once, after the feed has been released.
pub fn spawn_translator(
    mut feed: Box<dyn GenerationFeed>,
    cancel: CancellationToken,
) -> mpsc::Receiver<AppResult<StreamEvent>> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("translator stopping: stream cancelled");
                    break;
                }
                next = feed.next_event() => match next {
                    Ok(Some(event)) => {
                        let Some(translated) = translate(event) else {
                            continue;
                        };
                        if tx.send(Ok(translated)).await.is_err() {
                            debug!("translator stopping: receiver dropped");
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("translator stopping: feed drained");
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, "translator stopping: feed error");
                        let _ = tx.send(Err(err)).await;
                        break;
                    }
                },
            }
        }

        // Release precedes channel close on every path; the sender drops
        // when the task returns.
        feed.release().await;
    });

    rx
}

/// Map one feed variant to zero-or-one normalized events
fn translate(event: FeedEvent) -> Option<StreamEvent> {
    match event {
        FeedEvent::TextOutput { text: Some(text) } if !text.is_empty() => {
            Some(StreamEvent::delta(text, EventMeta::default()))
        }
        FeedEvent::TextOutput { .. } => {
            debug!("dropping output event with empty text");
            None
        }
        FeedEvent::Citation { references } => {
            let refs = references
                .into_iter()
                .map(|reference| CitationReference {
                    text: reference.text,
                    source: reference.source,
                })
                .collect();
            Some(StreamEvent::citation(refs, EventMeta::default()))
        }
        FeedEvent::Guardrail { action } => {
            info!(action = ?action, "guardrail intervention, not forwarded");
            None
        }
        FeedEvent::Other { label } => {
            warn!(variant = %label, "unrecognized stream variant dropped");
            None
        }
    }
}
