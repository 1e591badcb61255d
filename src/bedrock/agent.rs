// ABOUTME: Bedrock Agent client for knowledge-base ingestion jobs
// ABOUTME: Starts ingestion jobs with a duplicate-job guard over ListIngestionJobs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # Ingestion Client
//!
//! Wraps the Bedrock Agent control-plane calls needed to sync the
//! knowledge base with its data source: counting in-flight ingestion jobs
//! and starting a new one. Callers are expected to skip starting a job
//! when one is already running (see the `kb-sync` binary).

use crate::config::environment::BedrockConfig;
use crate::errors::{AppError, AppResult};
use aws_sdk_bedrockagent::error::DisplayErrorContext;
use aws_sdk_bedrockagent::types::IngestionJobStatus;
use aws_sdk_bedrockagent::Client;
use tracing::info;

/// Service label used in error messages
const SERVICE: &str = "bedrock-agent";

/// Create a Bedrock Agent client for the configured region
pub async fn agent_client(config: &BedrockConfig) -> Client {
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await;
    Client::new(&aws_config)
}

/// Knowledge-base ingestion operations
#[derive(Debug, Clone)]
pub struct IngestionClient {
    client: Client,
    knowledge_base_id: String,
    data_source_id: String,
}

impl IngestionClient {
    /// Create an ingestion client for one knowledge base and data source
    #[must_use]
    pub fn new(client: Client, config: &BedrockConfig) -> Self {
        Self {
            client,
            knowledge_base_id: config.knowledge_base_id.clone(),
            data_source_id: config.data_source_id.clone(),
        }
    }

    /// Count ingestion jobs that are currently starting or in progress
    ///
    /// # Errors
    ///
    /// Returns an error if the `ListIngestionJobs` call fails.
    pub async fn in_progress_job_count(&self, limit: i32) -> AppResult<usize> {
        let response = self
            .client
            .list_ingestion_jobs()
            .knowledge_base_id(&self.knowledge_base_id)
            .data_source_id(&self.data_source_id)
            .max_results(limit)
            .send()
            .await
            .map_err(|e| {
                AppError::external_service(SERVICE, format!("{}", DisplayErrorContext(&e)))
            })?;

        let count = response
            .ingestion_job_summaries()
            .iter()
            .filter(|summary| {
                matches!(
                    summary.status(),
                    &IngestionJobStatus::InProgress | &IngestionJobStatus::Starting
                )
            })
            .count();
        Ok(count)
    }

    /// Start an ingestion job for the configured data source
    ///
    /// # Errors
    ///
    /// Returns an error if the `StartIngestionJob` call fails.
    pub async fn start_ingestion_job(&self) -> AppResult<()> {
        let response = self
            .client
            .start_ingestion_job()
            .knowledge_base_id(&self.knowledge_base_id)
            .data_source_id(&self.data_source_id)
            .send()
            .await
            .map_err(|e| {
                AppError::external_service(SERVICE, format!("{}", DisplayErrorContext(&e)))
            })?;

        info!(job = ?response.ingestion_job(), "ingestion job started");
        Ok(())
    }
}
