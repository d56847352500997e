//! Flat JSON file model store

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::sync::RwLock;

use super::types::{ModelConfig, ModelsDocument, StoreError};
use super::ModelStore;

const API_KEY_FIELD: &str = "apikey";
const API_KEY_ALIAS: &str = "apiKey";

/// Model store persisted as a single pretty-printed JSON document
///
/// Reads take the shared side of the lock, mutations the exclusive side, so
/// a relay call never observes a half-written file.
pub struct JsonModelStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    async fn load(&self) -> Result<ModelsDocument, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ModelsDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, doc: &ModelsDocument) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(doc)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Every stored model, in file order
    pub async fn list(&self) -> Result<Vec<ModelConfig>, StoreError> {
        let _guard = self.lock.read().await;
        Ok(self.load().await?.models)
    }

    /// The whole document, for export
    pub async fn export(&self) -> Result<ModelsDocument, StoreError> {
        let _guard = self.lock.read().await;
        self.load().await
    }

    /// Append a model. Missing ids become `<name>_<unix-millis>`; the first
    /// model ever stored is made active.
    pub async fn create(&self, mut model: ModelConfig) -> Result<ModelConfig, StoreError> {
        let _guard = self.lock.write().await;
        let mut doc = self.load().await?;

        if model.id.trim().is_empty() {
            model.id = format!("{}_{}", model.name, Utc::now().timestamp_millis());
        }
        if doc.models.is_empty() {
            model.is_active = true;
        }

        doc.models.push(model.clone());
        self.save(&doc).await?;
        tracing::info!(id = %model.id, "model created");
        Ok(model)
    }

    /// Shallow-merge `patch` over the stored model.
    ///
    /// The `apiKey` spelling is folded onto the stored `apikey` key first. A
    /// patch that leaves the model unreadable is rejected as invalid.
    pub async fn update(
        &self,
        id: &str,
        mut patch: Map<String, Value>,
    ) -> Result<ModelConfig, StoreError> {
        if let Some(key) = patch.remove(API_KEY_ALIAS) {
            patch.entry(API_KEY_FIELD).or_insert(key);
        }

        let _guard = self.lock.write().await;
        let mut doc = self.load().await?;
        let idx = doc
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut merged = match serde_json::to_value(&doc.models[idx])? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        merged.extend(patch);
        let updated: ModelConfig = serde_json::from_value(Value::Object(merged))
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;

        doc.models[idx] = updated.clone();
        self.save(&doc).await?;
        tracing::info!(id, "model updated");
        Ok(updated)
    }

    /// Remove a model. If it was active, the first remaining model takes over.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.lock.write().await;
        let mut doc = self.load().await?;
        let idx = doc
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let removed = doc.models.remove(idx);
        if removed.is_active {
            if let Some(first) = doc.models.first_mut() {
                first.is_active = true;
            }
        }

        self.save(&doc).await?;
        tracing::info!(id, "model deleted");
        Ok(())
    }

    /// Flag exactly one model active
    pub async fn set_active(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.lock.write().await;
        let mut doc = self.load().await?;
        if doc.position(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        for model in &mut doc.models {
            model.is_active = model.id == id;
        }

        self.save(&doc).await?;
        tracing::info!(id, "active model switched");
        Ok(())
    }

    /// Replace the whole document. The payload must carry a `models` array.
    pub async fn import(&self, payload: Value) -> Result<usize, StoreError> {
        if !payload.get("models").is_some_and(Value::is_array) {
            return Err(StoreError::InvalidDocument(
                "payload must contain a `models` array".to_string(),
            ));
        }
        let doc: ModelsDocument = serde_json::from_value(payload)
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;

        let _guard = self.lock.write().await;
        self.save(&doc).await?;
        tracing::info!(count = doc.models.len(), "models imported");
        Ok(doc.models.len())
    }
}

#[async_trait]
impl ModelStore for JsonModelStore {
    async fn active_model(&self) -> Result<Option<ModelConfig>, StoreError> {
        let _guard = self.lock.read().await;
        Ok(self.load().await?.active().cloned())
    }
}
