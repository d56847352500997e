// POST /api/relay handler

use bytes::Bytes;
use tracing::warn;
use warp::http::header::{HeaderValue, CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use warp::Reply;

use crate::error::RelayError;
use crate::models::RelayRequest;
use crate::relay::RelayService;
use crate::sse::RelayBody;

pub async fn relay_handler(
    service: RelayService,
    body: Bytes,
) -> Result<warp::reply::Response, warp::Rejection> {
    let request: RelayRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return Ok(error_response(RelayError::InvalidRequest(e.to_string()))),
    };

    match service.relay(request).await {
        Ok(body) => Ok(event_stream(body)),
        Err(err) => Ok(error_response(err)),
    }
}

/// Stream the upstream bytes untouched under SSE headers
fn event_stream(body: RelayBody) -> warp::reply::Response {
    let mut response = warp::reply::stream(body).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

fn error_response(err: RelayError) -> warp::reply::Response {
    warn!(
        error_type = err.kind(),
        status = err.status().as_u16(),
        error = %err,
        "relay call failed"
    );
    err.into_response()
}
