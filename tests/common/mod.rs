use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chat_relay::config::ExtractorConfig;
use chat_relay::extract::ExtractorSet;
use chat_relay::llm::HttpRelayClient;
use chat_relay::pipeline::AttachmentPipeline;
use chat_relay::relay::RelayService;
use chat_relay::sse::RelayBody;
use chat_relay::store::JsonModelStore;
use futures::StreamExt;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Path the mock upstream serves chat completions on
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

pub const API_KEY: &str = "sk-integration";

/// Write a models.json with one active model pointing at `base_url`
pub fn store_with_active_model(base_url: &str) -> (TempDir, Arc<JsonModelStore>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("models.json");
    let doc = json!({
        "models": [
            {
                "id": "idle_1",
                "name": "Idle",
                "apiUrl": "http://127.0.0.1:1/unused",
                "apikey": "sk-unused",
                "type": "openrouter",
                "modelName": "idle-model",
                "isActive": false
            },
            {
                "id": "deepseek_1",
                "name": "DeepSeek",
                "apiUrl": format!("{}{}", base_url, COMPLETIONS_PATH),
                "apikey": API_KEY,
                "type": "deepseek",
                "modelName": "deepseek-chat",
                "isActive": true
            }
        ]
    });
    std::fs::write(&path, serde_json::to_vec_pretty(&doc).expect("json")).expect("write models");
    (dir, Arc::new(JsonModelStore::new(path)))
}

/// Store whose file does not exist yet
pub fn empty_store() -> (TempDir, Arc<JsonModelStore>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("models.json");
    (dir, Arc::new(JsonModelStore::new(path)))
}

/// Extractors wired to stand-in binaries: `false` for antiword, `true` for
/// soffice, and a tesseract that is not installed
pub fn stand_in_extractors() -> ExtractorSet {
    ExtractorSet::from_config(&ExtractorConfig {
        antiword_bin: PathBuf::from("false"),
        soffice_bin: PathBuf::from("true"),
        tesseract_bin: PathBuf::from("tesseract-not-installed-for-tests"),
        converter_timeout: Duration::from_secs(10),
        ocr_timeout: Duration::from_secs(10),
        ..ExtractorConfig::default()
    })
}

pub fn relay_service(store: Arc<JsonModelStore>) -> RelayService {
    let client = HttpRelayClient::new(Duration::from_secs(5)).expect("http client");
    RelayService::new(
        store,
        AttachmentPipeline::new(stand_in_extractors()),
        Arc::new(client),
    )
}

pub fn b64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Everything the client receives, and the error that cut it short, if any
pub async fn drain(mut body: RelayBody) -> (Vec<u8>, Option<String>) {
    let mut out = Vec::new();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => out.extend_from_slice(&bytes),
            Err(e) => return (out, Some(e.to_string())),
        }
    }
    (out, None)
}
