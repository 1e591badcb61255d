// ABOUTME: Bedrock backend module: generation feed seam, runtime client, and ingestion
// ABOUTME: Everything above this module depends only on the feed traits, not the SDK
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # Bedrock Backend
//!
//! - [`feed`]: the SDK-independent seam the streaming bridge consumes
//! - [`agent_runtime`]: the production `RetrieveAndGenerateStream` backend
//! - [`agent`]: control-plane ingestion jobs for the knowledge base

/// Knowledge-base ingestion job operations
pub mod agent;

/// Bedrock Agent Runtime implementation of the feed seam
pub mod agent_runtime;

/// The generation feed traits and variant vocabulary
pub mod feed;

pub use agent::{agent_client, IngestionClient};
pub use agent_runtime::{agent_runtime_client, BedrockBackend};
pub use feed::{FeedEvent, GenerationFeed, RetrieveAndGenerate, RetrievedReference};
