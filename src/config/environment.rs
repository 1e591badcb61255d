// ABOUTME: Environment-based configuration loading for the knowledge chat server
// ABOUTME: Parses AWS, knowledge-base, and streaming settings from process environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! Server configuration loaded from environment variables.
//!
//! Required variables fail startup with a `ConfigMissing` error; everything
//! else carries a production-safe default. A `.env` file is honored when
//! present so local development does not need exported variables.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Model ARN used for generation when `MODEL_ARN` is not set
const DEFAULT_MODEL_ARN: &str = "anthropic.claude-sonnet-4-5-20250929-v1:0";

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// AWS and knowledge-base settings
    pub bedrock: BedrockConfig,
    /// Streaming bridge settings
    pub streaming: StreamingConfig,
    /// Comma-separated CORS origins, or `*`
    pub cors_allowed_origins: String,
}

/// AWS Bedrock connection and knowledge-base settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedrockConfig {
    /// AWS region for Bedrock clients
    pub aws_region: String,
    /// Knowledge base queried by retrieve-and-generate
    pub knowledge_base_id: String,
    /// Data source for ingestion jobs
    pub data_source_id: String,
    /// Model ARN used for generation
    pub model_arn: String,
}

/// Streaming bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Server-side deadline bounding total stream lifetime (seconds)
    pub stream_timeout_secs: u64,
    /// Cadence of SSE comment heartbeats (seconds)
    pub heartbeat_secs: u64,
}

impl StreamingConfig {
    /// Stream deadline as a [`Duration`]
    #[must_use]
    pub const fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs)
    }

    /// Heartbeat cadence as a [`Duration`]
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is unset or a numeric
    /// variable fails to parse.
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        Ok(Self {
            http_port: parse_var("HTTP_PORT", "8080")?,
            bedrock: BedrockConfig {
                aws_region: env_var_required("AWS_REGION")?,
                knowledge_base_id: env_var_required("KNOWLEDGE_BASE_ID")?,
                data_source_id: env_var_required("DATA_SOURCE_ID")?,
                model_arn: env_var_or("MODEL_ARN", DEFAULT_MODEL_ARN),
            },
            streaming: StreamingConfig {
                stream_timeout_secs: parse_var("STREAM_TIMEOUT_SECS", "60")?,
                heartbeat_secs: parse_var("SSE_HEARTBEAT_SECS", "15")?,
            },
            cors_allowed_origins: env_var_or("CORS_ALLOWED_ORIGINS", "*"),
        })
    }

    /// One-line summary for startup logging
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} region={} knowledge_base={} timeout={}s heartbeat={}s",
            self.http_port,
            self.bedrock.aws_region,
            self.bedrock.knowledge_base_id,
            self.streaming.stream_timeout_secs,
            self.streaming.heartbeat_secs
        )
    }
}

/// Get an environment variable with a fallback default
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get a required environment variable
fn env_var_required(key: &str) -> AppResult<String> {
    env::var(key).map_err(|_| AppError::config_missing(key))
}

/// Parse an environment variable into a typed value, with a default
fn parse_var<T>(key: &str, default: &str) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    env_var_or(key, default)
        .parse()
        .map_err(|e| AppError::config(format!("invalid {key}: {e}")))
}
