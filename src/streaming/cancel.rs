// ABOUTME: Merges client-disconnect and server-deadline into one cancellation signal
// ABOUTME: Tracks the first-observed cause for terminal-event selection and diagnostics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # Cancellation Merger
//!
//! A stream can be torn down by the client going away or by the
//! server-side deadline. Callers should not poll two sources: this module
//! merges both into one [`CancellationToken`] plus a queryable
//! [`CancelCause`], set exactly once. Client-initiated cancellation takes
//! priority when both signals are observed together.
//!
//! Client disconnect is detected through a [`DisconnectGuard`] owned by
//! the response body stream: when hyper drops the body because the peer is
//! gone, the guard drops and the watcher observes it.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Why the merged cancellation signal fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// The inbound connection went away before the stream finished
    ClientDisconnected,
    /// The server-side stream deadline elapsed
    DeadlineExceeded,
}

impl CancelCause {
    /// Diagnostic text reported to the client on the terminal frame
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ClientDisconnected => "client disconnected",
            Self::DeadlineExceeded => "deadline exceeded",
        }
    }
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Held by the response body stream; dropping it signals client disconnect
///
/// Hyper drops the body stream when the peer disconnects, which drops this
/// guard. Normal completion also drops it, but by then the stream has
/// already terminated and the late signal is a no-op.
#[derive(Debug)]
pub struct DisconnectGuard {
    _tx: oneshot::Sender<()>,
}

/// Unified cancellation signal with a first-signal-wins cause
#[derive(Debug, Clone)]
pub struct StreamCancellation {
    token: CancellationToken,
    cause: Arc<OnceLock<CancelCause>>,
}

impl StreamCancellation {
    /// Start the merger for one stream
    ///
    /// Spawns a watcher that waits for whichever comes first — the guard
    /// dropping (client gone) or `deadline` elapsing — records the cause,
    /// and cancels the token. The deadline is anchored here, at
    /// stream-open time.
    #[must_use]
    pub fn spawn(deadline: Duration) -> (Self, DisconnectGuard) {
        let token = CancellationToken::new();
        let cause = Arc::new(OnceLock::new());
        let (tx, rx) = oneshot::channel::<()>();

        let watcher_token = token.clone();
        let watcher_cause = Arc::clone(&cause);
        tokio::spawn(async move {
            // biased: client disconnect wins when both arms are ready
            let fired = tokio::select! {
                biased;
                _ = rx => CancelCause::ClientDisconnected,
                () = sleep(deadline) => CancelCause::DeadlineExceeded,
            };
            let _ = watcher_cause.set(fired);
            watcher_token.cancel();
        });

        (Self { token, cause }, DisconnectGuard { _tx: tx })
    }

    /// Wait until the merged signal fires
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Whether the merged signal has fired
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The recorded cause; `None` until the signal has fired
    #[must_use]
    pub fn cause(&self) -> Option<CancelCause> {
        self.cause.get().copied()
    }

    /// A child token for tasks that must stop when the stream is cancelled
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }
}
