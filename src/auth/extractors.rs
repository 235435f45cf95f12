//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::models::{Claims, User};
use crate::common::{safe_email_log, ApiError, AppState};

pub const TOKEN_TTL_HOURS: i64 = 24;

/// Authenticated user extractor
///
/// Validates the bearer JWT and loads the user row. With dev mode on, the
/// configured dev account is used instead.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
}

/// Token from `Authorization: Bearer <token>`; a bare token is accepted too
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then(|| token.to_string())
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}

/// HS256 token for `user_id`, valid for 24 hours
pub fn issue_token(user_id: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Resolves the caller from request headers
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    if state.dev_mode.is_enabled() {
        let user = state.dev_mode.ensure_dev_user(&state.db).await?;
        debug!(
            user_id = %user.id,
            email = %safe_email_log(&user.email),
            "DEV MODE: Authentication bypassed"
        );
        return Ok(user);
    }

    let token = bearer_token(headers).ok_or_else(|| {
        warn!("Authentication failed: missing Authorization header");
        ApiError::Unauthorized("Authentication required".into())
    })?;

    let claims = decode_token(&token, &state.jwt_secret).map_err(|e| {
        warn!(error = %e, "JWT token validation failed");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&claims.sub)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %claims.sub, "Database error during user lookup");
            ApiError::DatabaseError(e)
        })?;

    user.ok_or_else(|| {
        warn!(user_id = %claims.sub, "Authentication failed: user not found");
        ApiError::Unauthorized("User not found".into())
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();
        let user = authenticate(&app_state, &parts.headers).await?;

        Ok(AuthedUser {
            id: user.id,
            email: user.email,
        })
    }
}
