// ABOUTME: Shared server state and the listen/serve loop
// ABOUTME: Holds configuration and the backend seam behind one Arc for all handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! Server state and serve loop
//!
//! [`ServerState`] is the single shared-resource container handed to every
//! route handler; the backend is held behind its trait object so tests can
//! substitute scripted implementations.

use crate::bedrock::feed::RetrieveAndGenerate;
use crate::config::ServerConfig;
use crate::routes;
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared resources for all route handlers
pub struct ServerState {
    /// Server configuration loaded at startup
    pub config: ServerConfig,
    /// The retrieve-and-generate backend
    pub backend: Arc<dyn RetrieveAndGenerate>,
}

impl ServerState {
    /// Create the shared state container
    #[must_use]
    pub fn new(config: ServerConfig, backend: Arc<dyn RetrieveAndGenerate>) -> Self {
        Self { config, backend }
    }
}

/// Bind the HTTP listener and serve until shutdown
///
/// # Errors
///
/// Returns an error if binding or serving fails.
pub async fn serve(state: Arc<ServerState>) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {addr}");

    let app = routes::router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
