// ABOUTME: Backend seam for retrieve-and-generate streaming, independent of the AWS SDK
// ABOUTME: Defines the feed variant vocabulary and the traits the bridge core depends on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # Generation Feed Seam
//!
//! The streaming bridge treats the backend as an opaque collaborator with
//! exactly this shape: one call opening a stream handle, a feed of tagged
//! variants, an error check (folded into [`GenerationFeed::next_event`]'s
//! `Result`), and an explicit release operation. Production code plugs in
//! the Bedrock Agent Runtime implementation; tests plug in scripted feeds.

use crate::errors::AppResult;
use async_trait::async_trait;

/// One reference retrieved by the knowledge base for a citation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievedReference {
    /// Textual snippet of the retrieved content
    pub text: String,
    /// Source locator, e.g. `s3://bucket/key`
    pub source: String,
}

/// Closed set of variants the backend feed can produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Incremental generated text; may be empty or absent
    TextOutput { text: Option<String> },
    /// Retrieved references backing the generation so far
    Citation { references: Vec<RetrievedReference> },
    /// A guardrail intervened; observability-only, never client-visible
    Guardrail { action: Option<String> },
    /// A variant this server does not recognize
    Other { label: String },
}

/// An open backend event feed for one invocation
///
/// Implementations own the upstream handle. `release` must be safe to call
/// exactly once on every exit path, including after a `next_event` error.
#[async_trait]
pub trait GenerationFeed: Send {
    /// Session id the backend allocated or echoed on its first response
    fn session_id(&self) -> Option<&str>;

    /// Await the next feed variant
    ///
    /// Returns `Ok(None)` when the feed is fully drained.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed reports an unrecoverable failure.
    async fn next_event(&mut self) -> AppResult<Option<FeedEvent>>;

    /// Release the upstream handle
    async fn release(&mut self);
}

/// The backend call opening a generation stream
#[async_trait]
pub trait RetrieveAndGenerate: Send + Sync {
    /// Start a retrieve-and-generate stream for one query
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call itself fails before any event
    /// is produced (e.g. invalid session, access denied).
    async fn retrieve_and_generate_stream(
        &self,
        session_id: Option<&str>,
        input_text: &str,
    ) -> AppResult<Box<dyn GenerationFeed>>;
}
