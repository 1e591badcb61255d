// ABOUTME: Server binary for the knowledge chat API
// ABOUTME: Loads configuration, builds the Bedrock backend, and serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # Knowledge Chat Server Binary
//!
//! Starts the retrieval-augmented chat API with environment-driven
//! configuration. Startup failures (missing configuration, bind errors)
//! are terminal.

use anyhow::Result;
use clap::Parser;
use knowledge_chat_server::{
    bedrock::{agent_runtime_client, BedrockBackend},
    config::ServerConfig,
    logging,
    server::{self, ServerState},
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "knowledge-chat-server")]
#[command(about = "Retrieval-augmented chat API over Bedrock knowledge bases")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration from environment
    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    // Initialize production logging
    logging::init_from_env()?;

    info!("Starting knowledge chat server");
    info!("{}", config.summary());

    let client = agent_runtime_client(&config.bedrock).await;
    let backend = Arc::new(BedrockBackend::new(client, &config.bedrock));

    let state = Arc::new(ServerState::new(config, backend));
    server::serve(state).await
}
