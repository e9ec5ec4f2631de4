//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::{Error, csv_import::MAX_UPLOAD_BYTES};

/// The number of characters of a body logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields that are never written to the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "token"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords and tokens in JSON bodies are redacted.
///
/// Multipart bodies are passed on unread so the route's own body limit
/// applies to uploads. Other request bodies larger than the upload limit
/// are rejected with 413 before they are read.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let summary = format!("Received request: {} {}", parts.method, parts.uri);

    let request = if has_content_type(&parts.headers, "multipart/") {
        tracing::info!("{summary}\nbody: <multipart body>");
        Request::from_parts(parts, body)
    } else {
        if body.size_hint().lower() > MAX_UPLOAD_BYTES as u64 {
            tracing::info!("{summary}\nbody: <too large>");
            return Error::UploadTooLarge.into_response();
        }

        let body_bytes = match axum::body::to_bytes(body, MAX_UPLOAD_BYTES).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::error!("Could not read request body: {error}");
                return Error::InvalidRequestBody(error.to_string()).into_response();
            }
        };

        log_body(&summary, &display_body(&parts.headers, &body_bytes));
        Request::from_parts(parts, Body::from(body_bytes))
    };

    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_body(
        &format!("Sending response: {}", parts.status),
        &display_body(&parts.headers, &body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

fn has_content_type(headers: &HeaderMap, prefix: &str) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with(prefix))
}

fn display_body(headers: &HeaderMap, body: &Bytes) -> String {
    if has_content_type(headers, "application/json") {
        redact_json(body)
    } else {
        String::from_utf8_lossy(body).into_owned()
    }
}

fn redact_json(body: &Bytes) -> String {
    let Ok(mut json) = serde_json::from_slice::<Value>(body) else {
        return String::from_utf8_lossy(body).into_owned();
    };

    if let Some(object) = json.as_object_mut() {
        for field in REDACTED_FIELDS {
            if let Some(value) = object.get_mut(field) {
                *value = Value::from("********");
            }
        }
    }

    json.to_string()
}

fn log_body(summary: &str, body: &str) {
    match body.char_indices().nth(LOG_BODY_LENGTH_LIMIT) {
        Some((end, _)) => {
            tracing::info!("{summary}\nbody: {}...", &body[..end]);
            tracing::debug!("Full body: {body:?}");
        }
        None => tracing::info!("{summary}\nbody: {body:?}"),
    }
}
