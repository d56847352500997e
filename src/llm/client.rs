//! HTTP client for the upstream chat-completions endpoint

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

use super::error::LlmError;
use super::provider::{ByteStream, LlmProvider};
use crate::models::UpstreamRequest;
use crate::store::ModelConfig;

/// Relays chat requests to whatever URL the active model points at
#[derive(Clone)]
pub struct HttpRelayClient {
    http_client: Client,
}

impl HttpRelayClient {
    /// Create a new client
    ///
    /// Only the connect phase is bounded; a streamed body may legitimately
    /// stay open for minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(connect_timeout: Duration) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| LlmError::ConnectionError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Make a streaming request to the model's endpoint
    async fn make_streaming_request(
        &self,
        model: &ModelConfig,
        request: &UpstreamRequest,
    ) -> Result<ByteStream, LlmError> {
        let url = model.api_url.trim();
        if url.is_empty() {
            return Err(LlmError::InvalidRequest(format!(
                "model '{}' has no API URL",
                model.id
            )));
        }

        let response = self
            .http_client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", model.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await?;

        // Check status
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "upstream returned an error");
            return Err(LlmError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        let byte_stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| LlmError::StreamError(e.to_string())));

        Ok(Box::pin(byte_stream))
    }
}

#[async_trait]
impl LlmProvider for HttpRelayClient {
    async fn stream_chat(
        &self,
        model: &ModelConfig,
        request: &UpstreamRequest,
    ) -> Result<ByteStream, LlmError> {
        self.make_streaming_request(model, request).await
    }
}
