// ABOUTME: Bedrock Agent Runtime implementation of the generation feed seam
// ABOUTME: Opens RetrieveAndGenerateStream calls and adapts the SDK event receiver
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! # Bedrock Agent Runtime Backend
//!
//! Production [`RetrieveAndGenerate`] implementation over the AWS SDK.
//! Queries go against a knowledge base with the configured model ARN; the
//! SDK's event receiver is adapted to the [`GenerationFeed`] shape so the
//! bridge core never touches SDK types.

use crate::bedrock::feed::{FeedEvent, GenerationFeed, RetrieveAndGenerate, RetrievedReference};
use crate::config::environment::BedrockConfig;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use aws_sdk_bedrockagentruntime::error::DisplayErrorContext;
use aws_sdk_bedrockagentruntime::operation::retrieve_and_generate_stream::RetrieveAndGenerateStreamOutput;
use aws_sdk_bedrockagentruntime::types::{
    KnowledgeBaseRetrieveAndGenerateConfiguration, RetrieveAndGenerateConfiguration,
    RetrieveAndGenerateInput, RetrieveAndGenerateStreamResponseOutput, RetrieveAndGenerateType,
};
use aws_sdk_bedrockagentruntime::Client;
use tracing::debug;

/// Service label used in error messages
const SERVICE: &str = "bedrock-agent-runtime";

/// Create a Bedrock Agent Runtime client for the configured region
pub async fn agent_runtime_client(config: &BedrockConfig) -> Client {
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await;
    Client::new(&aws_config)
}

/// Knowledge-base backed retrieve-and-generate backend
#[derive(Debug, Clone)]
pub struct BedrockBackend {
    client: Client,
    knowledge_base_id: String,
    model_arn: String,
}

impl BedrockBackend {
    /// Create a backend for one knowledge base and model
    #[must_use]
    pub fn new(client: Client, config: &BedrockConfig) -> Self {
        Self {
            client,
            knowledge_base_id: config.knowledge_base_id.clone(),
            model_arn: config.model_arn.clone(),
        }
    }
}

#[async_trait]
impl RetrieveAndGenerate for BedrockBackend {
    async fn retrieve_and_generate_stream(
        &self,
        session_id: Option<&str>,
        input_text: &str,
    ) -> AppResult<Box<dyn GenerationFeed>> {
        let input = RetrieveAndGenerateInput::builder()
            .text(input_text)
            .build()
            .map_err(|e| AppError::invalid_input(e.to_string()))?;

        let kb_config = KnowledgeBaseRetrieveAndGenerateConfiguration::builder()
            .knowledge_base_id(&self.knowledge_base_id)
            .model_arn(&self.model_arn)
            .build()
            .map_err(|e| AppError::config(e.to_string()))?;

        let configuration = RetrieveAndGenerateConfiguration::builder()
            .r#type(RetrieveAndGenerateType::KnowledgeBase)
            .knowledge_base_configuration(kb_config)
            .build()
            .map_err(|e| AppError::config(e.to_string()))?;

        let output = self
            .client
            .retrieve_and_generate_stream()
            .set_session_id(session_id.filter(|s| !s.is_empty()).map(str::to_owned))
            .input(input)
            .retrieve_and_generate_configuration(configuration)
            .send()
            .await
            .map_err(|e| {
                AppError::external_service(SERVICE, format!("{}", DisplayErrorContext(&e)))
            })?;

        let backend_session = output.session_id().to_owned();
        debug!(session_id = %backend_session, "retrieve-and-generate stream opened");

        Ok(Box::new(BedrockFeed {
            session_id: backend_session,
            output: Some(output),
        }))
    }
}

/// Adapter from the SDK event receiver to [`GenerationFeed`]
struct BedrockFeed {
    session_id: String,
    /// Taken on release; dropping the output closes the event stream
    output: Option<RetrieveAndGenerateStreamOutput>,
}

#[async_trait]
impl GenerationFeed for BedrockFeed {
    fn session_id(&self) -> Option<&str> {
        Some(self.session_id.as_str())
    }

    async fn next_event(&mut self) -> AppResult<Option<FeedEvent>> {
        let Some(output) = self.output.as_mut() else {
            return Ok(None);
        };

        let received = output
            .stream
            .recv()
            .await
            .map_err(|e| {
                AppError::external_service(SERVICE, format!("{}", DisplayErrorContext(&e)))
            })?;

        Ok(received.map(map_variant))
    }

    async fn release(&mut self) {
        if self.output.take().is_some() {
            debug!(session_id = %self.session_id, "generation feed released");
        }
    }
}

/// Map one SDK stream variant onto the seam vocabulary
fn map_variant(event: RetrieveAndGenerateStreamResponseOutput) -> FeedEvent {
    match event {
        RetrieveAndGenerateStreamResponseOutput::Output(output) => FeedEvent::TextOutput {
            text: Some(output.text),
        },
        RetrieveAndGenerateStreamResponseOutput::Citation(citation_event) => {
            let references = citation_event
                .citation
                .map(|citation| {
                    citation
                        .retrieved_references
                        .unwrap_or_default()
                        .into_iter()
                        .map(|reference| RetrievedReference {
                            text: reference
                                .content
                                .map(|content| content.text)
                                .unwrap_or_default(),
                            source: reference
                                .location
                                .and_then(|location| location.s3_location)
                                .and_then(|s3| s3.uri)
                                .unwrap_or_default(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            FeedEvent::Citation { references }
        }
        RetrieveAndGenerateStreamResponseOutput::Guardrail(guardrail) => FeedEvent::Guardrail {
            action: guardrail.action.map(|action| format!("{action:?}")),
        },
        other => FeedEvent::Other {
            label: format!("{other:?}"),
        },
    }
}
