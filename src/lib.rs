// ABOUTME: Main library entry point for the knowledge chat server
// ABOUTME: Exposes Bedrock retrieve-and-generate over a streaming SSE chat API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

#![deny(unsafe_code)]

//! # Knowledge Chat Server
//!
//! An HTTP service exposing retrieval-augmented chat backed by an AWS Bedrock
//! knowledge base. A single `RetrieveAndGenerateStream` call is consumed as an
//! asynchronous, multi-variant event feed and republished to the HTTP client
//! as a Server-Sent Events stream.
//!
//! ## Architecture
//!
//! - **`sse`**: the outbound event vocabulary and the wire-level SSE framing
//! - **`streaming`**: the bridge core — cancellation merging, upstream
//!   translation, and the controller loop that multiplexes the three
//!   lifecycle signals onto one response writer
//! - **`bedrock`**: the backend seam (traits) and its AWS SDK implementation
//! - **`routes`**: HTTP handlers wiring the bridge into axum
//! - **`config`**: environment-driven server configuration
//!
//! ## Lifecycle of one invocation
//!
//! 1. `POST /api/chat/stream` validates the request and opens the backend
//!    stream; a setup failure becomes a single `error` frame.
//! 2. A translator task drains the backend feed into a channel, releasing
//!    the feed handle on every exit path.
//! 3. The controller loop forwards translated events, injects heartbeat
//!    comments, and terminates exactly once — on upstream close, client
//!    disconnect, or deadline expiry.

/// Backend seam for Bedrock Agent Runtime and the ingestion client
pub mod bedrock;

/// Environment-driven configuration
pub mod config;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// Production logging and structured output
pub mod logging;

/// `HTTP` routes for chat streaming and health checks
pub mod routes;

/// Server state, router assembly, and the serve loop
pub mod server;

/// Server-Sent Events vocabulary and wire framing
pub mod sse;

/// The streaming bridge core: cancellation, translation, and control
pub mod streaming;
