// src/logging_middleware.rs
//! Request/response logging. Every request gets a request id; JSON bodies
//! are logged at debug level with credentials masked.

use axum::body::{to_bytes, HttpBody};
use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, Instrument, Level};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";
const MASK: &str = "***";
const MAX_LOGGED_BODY_BYTES: usize = 64 * 1024;
const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "confirm_password",
    "current_password",
    "new_password",
    "token",
    "api_key",
    "authorization",
];

/// Replaces credential values anywhere in a JSON document
pub fn mask_sensitive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if SENSITIVE_KEYS.contains(&key.to_lowercase().as_str()) {
                    *v = Value::String(MASK.to_string());
                } else {
                    mask_sensitive(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_sensitive),
        _ => {}
    }
}

/// Only JSON bodies are buffered; uploads, PDFs and HTML stream through
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

/// Bodies without a known size under the cap are never buffered
fn loggable(body: &Body) -> bool {
    body.size_hint()
        .upper()
        .map(|n| n <= MAX_LOGGED_BODY_BYTES as u64)
        .unwrap_or(false)
}

fn render_body(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let text = std::str::from_utf8(bytes).ok()?;
    match serde_json::from_str::<Value>(text) {
        Ok(mut json) => {
            mask_sensitive(&mut json);
            Some(serde_json::to_string_pretty(&json).unwrap_or_else(|_| text.to_string()))
        }
        Err(_) => Some(text.to_string()),
    }
}

/// Tags the request with an id, logs method, path, status and latency,
/// and in debug mode the JSON request and response bodies
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!("request", request_id = %request_id);
    async move {
        let started = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let log_bodies = tracing::enabled!(Level::DEBUG);

        let request = if log_bodies && is_json(request.headers()) && loggable(request.body()) {
            let (parts, body) = request.into_parts();
            let bytes = to_bytes(body, MAX_LOGGED_BODY_BYTES)
                .await
                .map_err(|_| StatusCode::BAD_REQUEST)?;
            if let Some(body) = render_body(&bytes) {
                debug!(method = %method, path = %path, request_body = %body, "Request");
            }
            Request::from_parts(parts, Body::from(bytes))
        } else {
            request
        };

        let response = next.run(request).await;

        let mut response = if log_bodies && is_json(response.headers()) && loggable(response.body()) {
            let (parts, body) = response.into_parts();
            let bytes = to_bytes(body, MAX_LOGGED_BODY_BYTES)
                .await
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
            if let Some(body) = render_body(&bytes) {
                debug!(status = %parts.status, response_body = %body, "Response");
            }
            Response::from_parts(parts, Body::from(bytes))
        } else {
            response
        };

        info!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Handled request"
        );

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        Ok(response)
    }
    .instrument(span)
    .await
}
