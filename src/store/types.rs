// Persisted model configuration types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One upstream LLM configuration as stored in `models.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "apiUrl", default)]
    pub api_url: String,
    #[serde(rename = "apikey", alias = "apiKey", default)]
    pub api_key: String,
    #[serde(rename = "modelName", default)]
    pub model_name: String,
    #[serde(rename = "type", default)]
    pub model_type: String,
    #[serde(rename = "isActive", default)]
    pub is_active: bool,
}

/// The whole `models.json` document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelsDocument {
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

impl ModelsDocument {
    pub fn active(&self) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.is_active)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.models.iter().position(|m| m.id == id)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on model store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed model store: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidDocument(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_persisted_field_names() {
        let model: ModelConfig = serde_json::from_value(json!({
            "id": "gpt_1",
            "name": "GPT",
            "apiUrl": "https://api.example.com/v1/chat/completions",
            "apikey": "sk-1",
            "type": "openrouter",
            "modelName": "gpt-4o",
            "isActive": true
        }))
        .unwrap();

        assert_eq!(model.api_key, "sk-1");
        assert_eq!(model.model_name, "gpt-4o");
        assert!(model.is_active);

        let value = serde_json::to_value(&model).unwrap();
        assert_eq!(value["apikey"], "sk-1");
        assert_eq!(value["isActive"], true);
    }

    #[test]
    fn test_api_key_alias_and_defaults() {
        let model: ModelConfig =
            serde_json::from_value(json!({"name": "x", "apiKey": "k"})).unwrap();
        assert_eq!(model.api_key, "k");
        assert!(!model.is_active);
        assert!(model.id.is_empty());
    }

    #[test]
    fn test_active_lookup() {
        let doc: ModelsDocument = serde_json::from_value(json!({
            "models": [
                {"id": "a", "isActive": false},
                {"id": "b", "isActive": true}
            ]
        }))
        .unwrap();
        assert_eq!(doc.active().map(|m| m.id.as_str()), Some("b"));
        assert_eq!(doc.position("a"), Some(0));
        assert_eq!(doc.position("zzz"), None);
    }
}
