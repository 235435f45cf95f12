// rate_limit_middleware.rs
use crate::auth::extractors::{bearer_token, decode_token};
use crate::common::AppState;
use crate::services::rate_limit::{Client, RateLimitResult};
use axum::{
    extract::{ConnectInfo, Extension, Request},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

#[derive(Serialize)]
struct RateLimitErrorResponse {
    error: String,
    code: String,
    retry_after: u64,
}

/// Socket peer IP; proxy headers only count when the peer is a trusted proxy
fn client_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trusted_proxies: &[String],
) -> Option<String> {
    let peer = connect_info.map(|info| info.0.ip().to_string());
    let behind_proxy = peer
        .as_deref()
        .map(|ip| trusted_proxies.iter().any(|p| p == ip))
        .unwrap_or(false);
    if !behind_proxy {
        return peer;
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|ip| ip.trim().to_string())
        })
        .or(peer)
}

/// A valid token counts against its user; anything else is anonymous
fn client_for(headers: &HeaderMap, jwt_secret: &str) -> Client {
    bearer_token(headers)
        .and_then(|token| decode_token(&token, jwt_secret).ok())
        .map(|claims| Client::User(claims.sub))
        .unwrap_or(Client::Anonymous)
}

pub async fn rate_limit_middleware(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let (limiter, jwt_secret) = {
        let state = state_lock.read().await;
        (state.rate_limit_service.clone(), state.jwt_secret.clone())
    };

    let ip = client_ip(
        request.headers(),
        connect_info.as_ref(),
        &limiter.config().trusted_proxies,
    );
    let client = client_for(request.headers(), &jwt_secret);

    match limiter.check(&client, ip.as_deref()).await {
        RateLimitResult::Allowed => next.run(request).await,
        RateLimitResult::Limited { retry_after } => {
            warn!(
                client = ?client,
                ip = ?ip,
                path = %request.uri().path(),
                retry_after = retry_after,
                "Request blocked by rate limiter"
            );

            let body = RateLimitErrorResponse {
                error: "Rate limit exceeded. Please try again later.".to_string(),
                code: "TOO_MANY_REQUESTS".to_string(),
                retry_after,
            };
            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("retry-after", value);
            }
            response
        }
    }
}
