//! Relay service: one call resolves the active model, turns attachments into
//! prompt text, and opens the upstream stream.
//!
//! Every failure before the first upstream byte is a [`RelayError`] the handler
//! answers with JSON. After that, errors only abort the streamed body.

use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::RelayError;
use crate::llm::{LlmError, LlmProvider};
use crate::models::{RelayRequest, UpstreamRequest};
use crate::pipeline::{AttachmentPipeline, PipelineOutcome};
use crate::prompt;
use crate::sse::{relay_body, RelayBody};
use crate::store::{ModelConfig, ModelStore};

/// A request that passed every local check and is ready for the upstream
#[derive(Debug, Clone)]
pub struct PreparedRelay {
    pub model: ModelConfig,
    pub request: UpstreamRequest,
}

#[derive(Clone)]
pub struct RelayService {
    store: Arc<dyn ModelStore>,
    pipeline: AttachmentPipeline,
    provider: Arc<dyn LlmProvider>,
}

impl RelayService {
    pub fn new(
        store: Arc<dyn ModelStore>,
        pipeline: AttachmentPipeline,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            store,
            pipeline,
            provider,
        }
    }

    /// Run one relay call up to the point where the client response starts
    pub async fn relay(&self, request: RelayRequest) -> Result<RelayBody, RelayError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("relay", %request_id);

        self.run(request).instrument(span).await
    }

    async fn run(&self, request: RelayRequest) -> Result<RelayBody, RelayError> {
        let prepared = self.prepare(request).await?;
        self.open_stream(&prepared).await
    }

    /// Resolve the model, process attachments and assemble the upstream body.
    ///
    /// Nothing here talks to the upstream.
    pub async fn prepare(&self, request: RelayRequest) -> Result<PreparedRelay, RelayError> {
        let model = match self.store.active_model().await? {
            Some(model) => model,
            None => {
                warn!("relay rejected: no active model");
                return Err(RelayError::Config);
            }
        };
        info!(
            model_id = %model.id,
            model_name = %model.model_name,
            messages = request.messages.len(),
            attachments = request.attachments().len(),
            "relay request accepted"
        );

        let combined = if request.attachments().is_empty() {
            String::new()
        } else {
            match self.pipeline.process_payloads(request.attachments()).await {
                PipelineOutcome::Ok(text) => text,
                PipelineOutcome::Fatal(errors) => {
                    warn!(failures = errors.len(), "attachment batch rejected");
                    return Err(RelayError::FileProcessing(errors));
                }
            }
        };

        let messages = prompt::assemble(request.messages, &combined)?;
        let request = UpstreamRequest::new(request.params, messages, Some(&model.model_name));

        Ok(PreparedRelay { model, request })
    }

    /// Send the upstream request and wait for its first chunk.
    ///
    /// An upstream that fails before producing any bytes is still reported as
    /// a JSON `streamError`, since no response has gone out yet.
    pub async fn open_stream(&self, prepared: &PreparedRelay) -> Result<RelayBody, RelayError> {
        let mut upstream = self
            .provider
            .stream_chat(&prepared.model, &prepared.request)
            .await?;

        let first = match upstream.next().await {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                warn!(error = %e, "upstream stream failed before the first chunk");
                return Err(match e {
                    LlmError::StreamError(msg) => RelayError::Stream(msg),
                    other => RelayError::Stream(other.to_string()),
                });
            }
            None => {
                debug!("upstream closed without a body");
                bytes::Bytes::new()
            }
        };

        info!("streaming upstream response");
        Ok(relay_body(first, upstream))
    }
}
