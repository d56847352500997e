//! Provider trait for the upstream LLM endpoint

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::Stream;
use std::pin::Pin;

use super::error::LlmError;
use crate::models::UpstreamRequest;
use crate::store::ModelConfig;

/// Raw upstream body, chunk by chunk as it arrives
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, LlmError>> + Send>>;

/// Interface the relay uses to reach the configured LLM endpoint
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a streaming chat request to the model's endpoint
    ///
    /// # Arguments
    /// * `model` - The active model configuration (endpoint URL and key)
    /// * `request` - The fully assembled upstream body
    ///
    /// # Returns
    /// The upstream SSE body as a byte stream, or `LlmError::HttpError` when
    /// the endpoint answered with a non-success status
    async fn stream_chat(
        &self,
        model: &ModelConfig,
        request: &UpstreamRequest,
    ) -> Result<ByteStream, LlmError>;
}
