// ABOUTME: Streaming bridge core wiring cancellation, translation, and control
// ABOUTME: Re-exports the cancellation merger, upstream translator, and controller loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # Streaming Bridge
//!
//! The concurrency core of the server. Three tasks cooperate per
//! invocation:
//!
//! - the **controller** owns the HTTP response body and performs a single
//!   blocking multiplexed wait per iteration ([`controller`]);
//! - the **translator** drains the backend feed into a handoff channel
//!   ([`translator`]);
//! - the **cancellation watcher** merges client disconnect and the server
//!   deadline into one signal with a cause ([`cancel`]).
//!
//! The handoff channel and the cancellation signal are the only shared
//! state: the channel has one producer, and the cause is written at most
//! once.

/// Cancellation merging for client disconnect and server deadline
pub mod cancel;

/// The controller loop driving the SSE response
pub mod controller;

/// Upstream feed translation onto the handoff channel
pub mod translator;

pub use cancel::{CancelCause, DisconnectGuard, StreamCancellation};
pub use controller::stream_bridge;
pub use translator::spawn_translator;
