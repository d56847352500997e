//! Client-visible error taxonomy for the relay endpoint

use serde::Serialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::reject::{LengthRequired, MethodNotAllowed, PayloadTooLarge};
use warp::{Rejection, Reply};

use crate::llm::LlmError;
use crate::store::StoreError;

/// Errors that end a relay call with a non-streaming JSON response
#[derive(Debug, Error)]
pub enum RelayError {
    /// No model is flagged active; the upstream is never contacted
    #[error("No active model is configured")]
    Config,

    /// One or more attachments could not be turned into text
    #[error("{}", .0.join("\n"))]
    FileProcessing(Vec<String>),

    /// Nothing left to send after prompt assembly
    #[error("Message is empty: provide text or at least one readable attachment")]
    EmptyMessage,

    /// Request body could not be decoded
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream LLM answered with a non-success status
    #[error("LLM API error (status {status})")]
    Llm { status: u16, body: Value },

    /// Upstream stream failed before anything was sent to the client
    #[error("Error streaming data from LLM: {0}")]
    Stream(String),

    /// Model store lookups/updates targeting a missing id
    #[error("Model not found: {0}")]
    NotFound(String),

    /// Anything else on the relay path
    #[error("Relay processing error: {0}")]
    Internal(String),
}

/// JSON body returned for every [`RelayError`]
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error_type: &'static str,
    pub message: String,
    pub details: Value,
}

impl RelayError {
    /// Stable tag clients switch on
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Config => "configError",
            RelayError::FileProcessing(_) => "fileProcessingError",
            RelayError::EmptyMessage => "emptyMessageError",
            RelayError::InvalidRequest(_) => "invalidRequest",
            RelayError::Llm { .. } => "llmError",
            RelayError::Stream(_) => "streamError",
            RelayError::NotFound(_) => "notFound",
            RelayError::Internal(_) => "relayError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Config
            | RelayError::FileProcessing(_)
            | RelayError::EmptyMessage
            | RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::Llm { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::NotFound(_) => StatusCode::NOT_FOUND,
            RelayError::Stream(_) | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let details = match self {
            RelayError::FileProcessing(messages) => json!(messages),
            RelayError::Llm { body, .. } => body.clone(),
            _ => Value::Null,
        };

        ErrorBody {
            error_type: self.kind(),
            message: self.to_string(),
            details,
        }
    }

    /// Build an upstream error from a raw response body.
    ///
    /// Structured provider errors are kept as-is; anything that is not JSON
    /// is wrapped in a generic `{"error": {"message": ...}}` shape.
    pub fn from_upstream(status: u16, raw: &str) -> Self {
        let body = serde_json::from_str::<Value>(raw)
            .unwrap_or_else(|_| json!({ "error": { "message": raw } }));
        RelayError::Llm { status, body }
    }
}

impl Reply for RelayError {
    fn into_response(self) -> warp::reply::Response {
        warp::reply::with_status(warp::reply::json(&self.body()), self.status()).into_response()
    }
}

/// Turn warp's own rejections (unknown route, wrong method, oversized body)
/// into the same JSON shape the handlers use
pub async fn handle_rejection(rejection: Rejection) -> Result<warp::reply::Response, Infallible> {
    let (status, error_type, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "notFound", "No such endpoint".to_string())
    } else if rejection.find::<PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "invalidRequest",
            "Request body exceeds the size limit".to_string(),
        )
    } else if rejection.find::<LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            "invalidRequest",
            "A content-length header is required".to_string(),
        )
    } else if rejection.find::<MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "invalidRequest",
            "HTTP method not allowed".to_string(),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            "invalidRequest",
            format!("Invalid request: {:?}", rejection),
        )
    };

    let body = ErrorBody {
        error_type,
        message,
        details: Value::Null,
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status).into_response())
}

impl From<LlmError> for RelayError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::HttpError { status, body } => RelayError::from_upstream(status, &body),
            LlmError::StreamError(msg) => RelayError::Stream(msg),
            other => RelayError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for RelayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => RelayError::NotFound(id),
            StoreError::InvalidDocument(msg) => RelayError::InvalidRequest(msg),
            other => RelayError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = RelayError::Config;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "configError");
        assert!(err.body().details.is_null());
    }

    #[test]
    fn test_file_processing_error_lists_every_message() {
        let err = RelayError::FileProcessing(vec![
            "a.doc: failed".to_string(),
            "b.xyz: unsupported".to_string(),
        ]);
        let body = err.body();
        assert_eq!(body.error_type, "fileProcessingError");
        assert_eq!(body.message, "a.doc: failed\nb.xyz: unsupported");
        assert_eq!(body.details, json!(["a.doc: failed", "b.xyz: unsupported"]));
    }

    #[test]
    fn test_upstream_json_body_is_preserved() {
        let err = RelayError::from_upstream(429, r#"{"error":{"message":"rate limited"}}"#);
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = err.body();
        assert_eq!(body.error_type, "llmError");
        assert_eq!(body.details, json!({"error": {"message": "rate limited"}}));
    }

    #[test]
    fn test_upstream_text_body_is_wrapped() {
        let err = RelayError::from_upstream(502, "Bad Gateway");
        assert_eq!(
            err.body().details,
            json!({"error": {"message": "Bad Gateway"}})
        );
    }

    #[test]
    fn test_invalid_upstream_status_falls_back() {
        let err = RelayError::Llm {
            status: 1000,
            body: Value::Null,
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_stream_error_before_headers() {
        let err: RelayError = LlmError::StreamError("connection reset".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "streamError");
        assert!(err.to_string().contains("connection reset"));
    }
}
