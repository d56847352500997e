// /api/models handlers: CRUD over the model configuration file

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use warp::http::header;
use warp::Reply;

use crate::error::RelayError;
use crate::store::{JsonModelStore, ModelConfig, ModelStore};

type HandlerResult = Result<warp::reply::Response, warp::Rejection>;

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub id: String,
}

fn respond<T: serde::Serialize>(result: Result<T, RelayError>) -> HandlerResult {
    Ok(match result {
        Ok(value) => warp::reply::json(&value).into_response(),
        Err(err) => {
            tracing::warn!(error_type = err.kind(), error = %err, "model store request failed");
            err.into_response()
        }
    })
}

fn parse<T: DeserializeOwned>(body: &Bytes) -> Result<T, RelayError> {
    serde_json::from_slice(body).map_err(|e| RelayError::InvalidRequest(e.to_string()))
}

fn success() -> Value {
    json!({ "success": true })
}

// GET /api/models
pub async fn list_models(store: Arc<JsonModelStore>) -> HandlerResult {
    respond(store.list().await.map_err(RelayError::from))
}

// POST /api/models
pub async fn create_model(store: Arc<JsonModelStore>, body: Bytes) -> HandlerResult {
    let result: Result<Value, RelayError> = async {
        let model: ModelConfig = parse(&body)?;
        let created = store.create(model).await?;
        Ok(json!({ "success": true, "id": created.id }))
    }
    .await;
    respond(result)
}

// PUT /api/models/{id}
pub async fn update_model(id: String, store: Arc<JsonModelStore>, body: Bytes) -> HandlerResult {
    let result: Result<Value, RelayError> = async {
        let patch: Map<String, Value> = parse(&body)?;
        store.update(&id, patch).await?;
        Ok(success())
    }
    .await;
    respond(result)
}

// DELETE /api/models/{id}
pub async fn delete_model(id: String, store: Arc<JsonModelStore>) -> HandlerResult {
    respond(store.delete(&id).await.map(|_| success()).map_err(RelayError::from))
}

// POST /api/models/active
pub async fn set_active_model(store: Arc<JsonModelStore>, body: Bytes) -> HandlerResult {
    let result: Result<Value, RelayError> = async {
        let request: SetActiveRequest = parse(&body)?;
        store.set_active(&request.id).await?;
        Ok(success())
    }
    .await;
    respond(result)
}

// GET /api/models/active
pub async fn get_active_model(store: Arc<JsonModelStore>) -> HandlerResult {
    respond(store.active_model().await.map_err(RelayError::from))
}

// POST /api/models/import
pub async fn import_models(store: Arc<JsonModelStore>, body: Bytes) -> HandlerResult {
    let result: Result<Value, RelayError> = async {
        let payload: Value = parse(&body)?;
        let count = store.import(payload).await?;
        Ok(json!({ "success": true, "count": count }))
    }
    .await;
    respond(result)
}

// GET /api/models/export
pub async fn export_models(store: Arc<JsonModelStore>) -> HandlerResult {
    let doc = match store.export().await {
        Ok(doc) => doc,
        Err(err) => return respond::<Value>(Err(err.into())),
    };

    let reply = warp::reply::with_header(
        warp::reply::json(&doc),
        header::CONTENT_DISPOSITION,
        "attachment; filename=\"models.json\"",
    );
    Ok(reply.into_response())
}
