// ABOUTME: Knowledge-base sync trigger with a duplicate-job guard
// ABOUTME: Starts a Bedrock ingestion job unless one is already running
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # Knowledge Base Sync
//!
//! One-shot trigger for knowledge-base ingestion, suitable for cron or a
//! scheduler. Skips cleanly when an ingestion job is already starting or
//! in progress so overlapping invocations never stack jobs.

use anyhow::Result;
use clap::Parser;
use knowledge_chat_server::{
    bedrock::{agent_client, IngestionClient},
    config::ServerConfig,
    logging,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "kb-sync")]
#[command(about = "Start a knowledge-base ingestion job unless one is already running")]
pub struct Args {}

#[tokio::main]
async fn main() -> Result<()> {
    let _args = Args::parse();

    let config = ServerConfig::from_env()?;
    logging::init_from_env()?;

    let client = agent_client(&config.bedrock).await;
    let ingestion = IngestionClient::new(client, &config.bedrock);

    let in_progress = ingestion.in_progress_job_count(1).await?;
    if in_progress > 0 {
        info!("ingestion job already in progress, skipping new job start");
        return Ok(());
    }

    ingestion.start_ingestion_job().await?;
    Ok(())
}
