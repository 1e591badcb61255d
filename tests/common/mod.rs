// ABOUTME: Shared test fixtures: scripted generation feeds and SSE frame parsing
// ABOUTME: Lets tests drive the streaming bridge without any network backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

// Not every fixture is used by every test binary that includes this module.
#![allow(dead_code)]

use async_trait::async_trait;
use knowledge_chat_server::bedrock::feed::{FeedEvent, GenerationFeed, RetrieveAndGenerate};
use knowledge_chat_server::config::environment::{
    BedrockConfig, ServerConfig, StreamingConfig,
};
use knowledge_chat_server::errors::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

/// One scripted step of a fake backend feed
#[derive(Debug)]
pub enum FeedStep {
    /// Produce a feed event
    Event(FeedEvent),
    /// Sleep before the next step
    Delay(Duration),
    /// Fail the feed with this message
    Error(String),
    /// Block until the stream is torn down
    Hang,
}

/// A scripted in-memory feed with release tracking
pub struct ScriptedFeed {
    session_id: Option<String>,
    steps: VecDeque<FeedStep>,
    released: Arc<AtomicUsize>,
}

impl ScriptedFeed {
    pub fn new(session_id: Option<String>, steps: Vec<FeedStep>) -> (Self, Arc<AtomicUsize>) {
        let released = Arc::new(AtomicUsize::new(0));
        let feed = Self::with_counter(session_id, steps, Arc::clone(&released));
        (feed, released)
    }

    pub fn with_counter(
        session_id: Option<String>,
        steps: Vec<FeedStep>,
        released: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            session_id,
            steps: steps.into(),
            released,
        }
    }
}

#[async_trait]
impl GenerationFeed for ScriptedFeed {
    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    async fn next_event(&mut self) -> AppResult<Option<FeedEvent>> {
        loop {
            match self.steps.pop_front() {
                None => return Ok(None),
                Some(FeedStep::Event(event)) => return Ok(Some(event)),
                Some(FeedStep::Delay(duration)) => sleep(duration).await,
                Some(FeedStep::Error(message)) => {
                    return Err(AppError::external_service("test-backend", message))
                }
                Some(FeedStep::Hang) => sleep(Duration::from_secs(3600)).await,
            }
        }
    }

    async fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Outcome the scripted backend produces for its next call
pub enum ScriptOutcome {
    /// Fail the backend call before any event is produced
    Fail(String),
    /// Open a scripted feed
    Stream {
        session_id: Option<String>,
        steps: Vec<FeedStep>,
    },
}

/// A backend whose single next call is scripted in advance
pub struct ScriptedBackend {
    outcome: Mutex<Option<ScriptOutcome>>,
    pub released: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn new(outcome: ScriptOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(Some(outcome)),
            released: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl RetrieveAndGenerate for ScriptedBackend {
    async fn retrieve_and_generate_stream(
        &self,
        _session_id: Option<&str>,
        _input_text: &str,
    ) -> AppResult<Box<dyn GenerationFeed>> {
        let outcome = self
            .outcome
            .lock()
            .unwrap()
            .take()
            .expect("scripted backend called more than once");
        match outcome {
            ScriptOutcome::Fail(message) => {
                Err(AppError::external_service("test-backend", message))
            }
            ScriptOutcome::Stream { session_id, steps } => Ok(Box::new(
                ScriptedFeed::with_counter(session_id, steps, Arc::clone(&self.released)),
            )),
        }
    }
}

/// Server configuration for tests; streaming knobs chosen so neither the
/// deadline nor the heartbeat interferes unless a test wants them to
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        bedrock: BedrockConfig {
            aws_region: "us-east-1".into(),
            knowledge_base_id: "kb-test".into(),
            data_source_id: "ds-test".into(),
            model_arn: "arn:test".into(),
        },
        streaming: StreamingConfig {
            stream_timeout_secs: 60,
            heartbeat_secs: 600,
        },
        cors_allowed_origins: "*".into(),
    }
}

/// One parsed SSE frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub event: Option<String>,
    pub data: Option<serde_json::Value>,
    pub comment: Option<String>,
}

impl Frame {
    pub fn event_name(&self) -> &str {
        self.event.as_deref().unwrap_or("")
    }

    pub fn is_comment(&self) -> bool {
        self.comment.is_some()
    }
}

/// Parse concatenated SSE output into frames (blank-line delimited)
pub fn parse_frames(raw: &str) -> Vec<Frame> {
    raw.split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .map(|block| {
            let mut frame = Frame {
                event: None,
                data: None,
                comment: None,
            };
            for line in block.lines() {
                if let Some(name) = line.strip_prefix("event: ") {
                    frame.event = Some(name.to_owned());
                } else if let Some(data) = line.strip_prefix("data: ") {
                    frame.data = serde_json::from_str(data).ok();
                } else if let Some(comment) = line.strip_prefix(':') {
                    frame.comment = Some(comment.to_owned());
                }
            }
            frame
        })
        .collect()
}

/// Content and terminal frames only, in order (comments stripped)
pub fn content_frames(frames: &[Frame]) -> Vec<Frame> {
    frames.iter().filter(|f| !f.is_comment()).cloned().collect()
}
