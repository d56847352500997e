// HTTP server modules
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod sse;

// Relay core
pub mod extract;
pub mod pipeline;
pub mod prompt;
pub mod relay;

// Model configuration store
pub mod store;

// Upstream LLM client
pub mod llm;

use std::sync::Arc;

use config::ServerConfig;
use extract::ExtractorSet;
use llm::{HttpRelayClient, LlmError};
use pipeline::AttachmentPipeline;
use relay::RelayService;
use routes::AppState;
use store::JsonModelStore;

/// Wire the production state from configuration
pub fn build_state(config: &ServerConfig) -> Result<AppState, LlmError> {
    let models = Arc::new(JsonModelStore::new(config.models_file.clone()));
    let extractors = ExtractorSet::from_config(&config.extractor_config());
    let provider = HttpRelayClient::new(config.upstream_connect_timeout())?;

    let relay = RelayService::new(
        models.clone(),
        AttachmentPipeline::new(extractors),
        Arc::new(provider),
    );

    Ok(AppState {
        relay,
        models,
        body_limit: config.body_limit_bytes(),
    })
}
