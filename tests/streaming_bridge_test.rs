// ABOUTME: Integration tests for the streaming bridge core
// ABOUTME: Covers ordering, terminal-event uniqueness, cancellation, and resource release
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

// Tests drive the translator + controller pair against scripted feeds,
// asserting the client-visible frame sequences and the feed lifecycle.

mod common;

use common::{content_frames, parse_frames, FeedStep, ScriptedFeed};
use futures_util::StreamExt;
use knowledge_chat_server::bedrock::feed::{FeedEvent, RetrievedReference};
use knowledge_chat_server::sse::emitter::SseEmitter;
use knowledge_chat_server::sse::events::EventMeta;
use knowledge_chat_server::streaming::cancel::{CancelCause, StreamCancellation};
use knowledge_chat_server::streaming::controller::stream_bridge;
use knowledge_chat_server::streaming::translator::spawn_translator;
use std::pin::pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

const LONG: Duration = Duration::from_secs(60);
const HEARTBEAT_OFF: Duration = Duration::from_secs(600);

fn text(s: &str) -> FeedStep {
    FeedStep::Event(FeedEvent::TextOutput {
        text: Some(s.to_owned()),
    })
}

/// Run a scripted feed through the full bridge and collect every frame
async fn run_bridge(
    steps: Vec<FeedStep>,
    deadline: Duration,
    heartbeat: Duration,
) -> (String, Arc<AtomicUsize>) {
    let (feed, released) = ScriptedFeed::new(None, steps);
    let (cancellation, guard) = StreamCancellation::spawn(deadline);
    let events = spawn_translator(Box::new(feed), cancellation.child_token());
    let emitter = SseEmitter::new(EventMeta::for_session(Some("sess-test".into())));
    let body = stream_bridge(events, cancellation, guard, emitter, heartbeat);

    let mut body = pin!(body);
    let mut raw = String::new();
    while let Some(Ok(chunk)) = body.next().await {
        raw.push_str(std::str::from_utf8(&chunk).unwrap());
    }
    (raw, released)
}

#[tokio::test]
async fn test_ordered_stream_completes() {
    // Scenario A: two text chunks then normal closure.
    let (raw, released) = run_bridge(
        vec![text("Hello"), text(" world")],
        LONG,
        HEARTBEAT_OFF,
    )
    .await;

    let frames = content_frames(&parse_frames(&raw));
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[0].event_name(), "message.start");
    assert_eq!(frames[1].event_name(), "message.delta");
    assert_eq!(frames[1].data.as_ref().unwrap()["delta"], "Hello");
    assert_eq!(frames[2].event_name(), "message.delta");
    assert_eq!(frames[2].data.as_ref().unwrap()["delta"], " world");
    assert_eq!(frames[3].event_name(), "message.end");
    assert_eq!(
        frames[3].data.as_ref().unwrap()["finish_reason"],
        "completed"
    );
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_citation_keeps_both_references() {
    // Scenario D: one citation event carrying two references.
    let steps = vec![FeedStep::Event(FeedEvent::Citation {
        references: vec![
            RetrievedReference {
                text: "alpha".into(),
                source: "s3://kb/alpha.txt".into(),
            },
            RetrievedReference {
                text: "beta".into(),
                source: "s3://kb/beta.txt".into(),
            },
        ],
    })];
    let (raw, _released) = run_bridge(steps, LONG, HEARTBEAT_OFF).await;

    let frames = content_frames(&parse_frames(&raw));
    assert_eq!(frames[0].event_name(), "message.start");
    assert_eq!(frames[1].event_name(), "message.citation");
    let refs = frames[1].data.as_ref().unwrap()["refs"].as_array().unwrap();
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0]["text"], "alpha");
    assert_eq!(refs[0]["source"], "s3://kb/alpha.txt");
    assert_eq!(refs[1]["text"], "beta");
    assert_eq!(refs[1]["source"], "s3://kb/beta.txt");
}

#[tokio::test]
async fn test_empty_and_unknown_variants_are_dropped() {
    let steps = vec![
        FeedStep::Event(FeedEvent::TextOutput { text: None }),
        FeedStep::Event(FeedEvent::TextOutput {
            text: Some(String::new()),
        }),
        FeedStep::Event(FeedEvent::Other {
            label: "NewVariant".into(),
        }),
        FeedStep::Event(FeedEvent::Guardrail {
            action: Some("INTERVENED".into()),
        }),
        text("visible"),
    ];
    let (raw, _released) = run_bridge(steps, LONG, HEARTBEAT_OFF).await;

    let frames = content_frames(&parse_frames(&raw));
    // Only start, the one visible delta, and the terminal frame.
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[1].data.as_ref().unwrap()["delta"], "visible");
}

#[tokio::test]
async fn test_mid_stream_feed_error_ends_with_error_event() {
    let steps = vec![text("partial"), FeedStep::Error("connection reset".into())];
    let (raw, released) = run_bridge(steps, LONG, HEARTBEAT_OFF).await;

    let frames = content_frames(&parse_frames(&raw));
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].event_name(), "message.start");
    assert_eq!(frames[1].event_name(), "message.delta");
    assert_eq!(frames[2].event_name(), "error");
    let message = frames[2].data.as_ref().unwrap()["message"]
        .as_str()
        .unwrap()
        .to_owned();
    assert!(message.contains("connection reset"));
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_deadline_exceeded_emits_single_terminal_frame() {
    // Feed never produces anything; the 50ms deadline must terminate the
    // stream with one message.end{error} and no message.start.
    let (raw, released) = timeout(
        Duration::from_secs(5),
        run_bridge(vec![FeedStep::Hang], Duration::from_millis(50), HEARTBEAT_OFF),
    )
    .await
    .expect("deadline should end the stream");

    let frames = content_frames(&parse_frames(&raw));
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].event_name(), "message.end");
    let data = frames[0].data.as_ref().unwrap();
    assert_eq!(data["finish_reason"], "error");
    assert_eq!(data["detail"], "deadline exceeded");

    // Translator releases on its own exit path shortly after cancellation.
    sleep(Duration::from_millis(100)).await;
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_client_disconnect_releases_feed() {
    // Scenario C: the client goes away mid-stream; the feed must be
    // released promptly and the cause recorded as client disconnect.
    let (feed, released) = ScriptedFeed::new(
        None,
        vec![text("partial"), FeedStep::Hang],
    );
    let (cancellation, guard) = StreamCancellation::spawn(LONG);
    let observer = cancellation.clone();
    let events = spawn_translator(Box::new(feed), cancellation.child_token());
    let emitter = SseEmitter::new(EventMeta::default());
    let body = stream_bridge(events, cancellation, guard, emitter, HEARTBEAT_OFF);

    {
        let mut body = pin!(body);
        // Consume start + first delta, then drop the body like hyper does
        // when the peer disconnects.
        let first = body.next().await.unwrap().unwrap();
        assert!(std::str::from_utf8(&first).unwrap().contains("message.start"));
        let second = body.next().await.unwrap().unwrap();
        assert!(std::str::from_utf8(&second).unwrap().contains("partial"));
    }

    timeout(Duration::from_secs(1), observer.cancelled())
        .await
        .expect("dropping the body should cancel the stream");
    assert_eq!(observer.cause(), Some(CancelCause::ClientDisconnected));

    sleep(Duration::from_millis(100)).await;
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_heartbeats_do_not_disturb_content_order() {
    // A fast heartbeat interleaves comments but never reorders or drops
    // content frames.
    let steps = vec![
        text("a"),
        FeedStep::Delay(Duration::from_millis(60)),
        text("b"),
    ];
    let (raw, _released) = run_bridge(steps, LONG, Duration::from_millis(10)).await;

    let frames = parse_frames(&raw);
    assert!(
        frames.iter().any(common::Frame::is_comment),
        "expected at least one heartbeat comment"
    );
    for frame in frames.iter().filter(|f| f.is_comment()) {
        assert_eq!(frame.comment.as_deref(), Some("ping"));
    }

    let content = content_frames(&frames);
    let names: Vec<&str> = content.iter().map(common::Frame::event_name).collect();
    assert_eq!(
        names,
        vec!["message.start", "message.delta", "message.delta", "message.end"]
    );
    assert_eq!(content[1].data.as_ref().unwrap()["delta"], "a");
    assert_eq!(content[2].data.as_ref().unwrap()["delta"], "b");
}

#[tokio::test]
async fn test_exactly_one_terminal_event_per_run() {
    // Across a normal run, a failing run, and a deadline run, the number
    // of terminal frames is always exactly one and nothing follows it.
    let runs = vec![
        run_bridge(vec![text("x")], LONG, HEARTBEAT_OFF).await,
        run_bridge(vec![FeedStep::Error("boom".into())], LONG, HEARTBEAT_OFF).await,
        run_bridge(
            vec![FeedStep::Hang],
            Duration::from_millis(40),
            HEARTBEAT_OFF,
        )
        .await,
    ];

    for (raw, released) in runs {
        let frames = content_frames(&parse_frames(&raw));
        let terminal_count = frames
            .iter()
            .filter(|f| {
                f.event_name() == "error"
                    || (f.event_name() == "message.end")
            })
            .count();
        assert_eq!(terminal_count, 1, "frames: {frames:?}");
        let last = frames.last().unwrap();
        assert!(
            last.event_name() == "message.end" || last.event_name() == "error",
            "terminal frame must be last"
        );

        let starts = frames
            .iter()
            .filter(|f| f.event_name() == "message.start")
            .count();
        let content = frames
            .iter()
            .filter(|f| {
                f.event_name() == "message.delta" || f.event_name() == "message.citation"
            })
            .count();
        assert_eq!(starts, usize::from(content > 0));

        sleep(Duration::from_millis(100)).await;
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_session_id_stamped_on_every_frame() {
    let (raw, _released) = run_bridge(vec![text("hi")], LONG, HEARTBEAT_OFF).await;
    let frames = content_frames(&parse_frames(&raw));
    for frame in &frames {
        assert_eq!(
            frame.data.as_ref().unwrap()["session_id"],
            "sess-test",
            "frame {frame:?} missing session id"
        );
    }
}
