//! Error types for the upstream LLM call

use thiserror::Error;

/// Errors that can occur when talking to the upstream endpoint
#[derive(Debug, Error)]
pub enum LlmError {
    /// Non-success HTTP status; `body` is the raw response text
    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    /// Failure while reading the streamed body
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Request could not be sent (DNS, connect, TLS)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Invalid request parameters (e.g. a malformed API URL)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            LlmError::HttpError {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else if err.is_builder() {
            LlmError::InvalidRequest(err.to_string())
        } else if err.is_body() || err.is_decode() {
            LlmError::StreamError(err.to_string())
        } else {
            LlmError::ConnectionError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error() {
        let err = LlmError::HttpError {
            status: 404,
            body: "Not found".to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("Not found"));
    }

    #[test]
    fn test_stream_error() {
        let err = LlmError::StreamError("unexpected EOF".to_string());
        assert!(err.to_string().contains("Stream error"));
        assert!(err.to_string().contains("unexpected EOF"));
    }
}
