//! Authentication and profile handlers

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDateTime;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::extractors::{issue_token, AuthedUser};
use super::models::{ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest, User};
use super::password::{hash_password, verify_password};
use super::validators::{first_error, ChangePasswordValidator, RegisterValidator};
use crate::common::{generate_user_id, safe_email_log, ApiError, AppState, Validator};

// ---- Helper Functions ----

pub async fn fetch_user(db: &SqlitePool, user_id: &str) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// `created_at` as "March 2025", or "N/A"
pub fn member_since(created_at: Option<&str>) -> String {
    created_at
        .and_then(|raw| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
                .ok()
        })
        .map(|dt| dt.format("%B %Y").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn token_response(user: User, jwt_secret: &str) -> Result<serde_json::Value, ApiError> {
    let token = issue_token(&user.id, jwt_secret).map_err(|e| {
        error!(error = %e, user_id = %user.id, "JWT encoding error");
        ApiError::InternalServer("Failed to issue token".to_string())
    })?;
    Ok(json!({ "token": token, "user": user }))
}

fn hash_or_500(password: &str) -> Result<String, ApiError> {
    hash_password(password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ApiError::InternalServer("Failed to process password".to_string())
    })
}

// ============================================================================
// Registration and login
// ============================================================================

/// POST /api/auth/register
pub async fn register(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = RegisterValidator.validate(&payload);
    if let Some(message) = first_error(&validation) {
        return Err(ApiError::BadRequest(message));
    }

    let username = payload.username.unwrap_or_default().trim().to_string();
    let email = payload.email.unwrap_or_default().trim().to_lowercase();
    let password = payload.password.unwrap_or_default();

    let email_taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(&state.db)
        .await?;
    if email_taken > 0 {
        warn!(email = %safe_email_log(&email), "Registration rejected: email exists");
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let username_taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(&username)
        .fetch_one(&state.db)
        .await?;
    if username_taken > 0 {
        return Err(ApiError::Conflict("Username already taken".to_string()));
    }

    let user_id = generate_user_id();
    let password_hash = hash_or_500(&password)?;

    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, first_name, last_name)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user_id)
    .bind(&username)
    .bind(&email)
    .bind(&password_hash)
    .bind(payload.first_name.as_deref().map(str::trim))
    .bind(payload.last_name.as_deref().map(str::trim))
    .execute(&state.db)
    .await?;

    let user = fetch_user(&state.db, &user_id).await?;
    info!(user_id = %user.id, email = %safe_email_log(&user.email), "User registered");

    Ok((StatusCode::CREATED, Json(token_response(user, &state.jwt_secret)?)))
}

/// POST /api/auth/login
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let email = payload.email.unwrap_or_default().trim().to_lowercase();
    let password = payload.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest("Please fill in all fields".to_string()));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    match user {
        Some(user) if verify_password(&password, &user.password_hash) => {
            info!(user_id = %user.id, email = %safe_email_log(&email), "User logged in");
            Ok(Json(token_response(user, &state.jwt_secret)?))
        }
        _ => {
            warn!(email = %safe_email_log(&email), "Login failed");
            Err(ApiError::Unauthorized("Invalid email or password".to_string()))
        }
    }
}

/// POST /api/auth/logout
/// Tokens are stateless; the client discards its copy.
pub async fn logout(authed: AuthedUser) -> Result<Json<serde_json::Value>, ApiError> {
    info!(user_id = %authed.id, "User logged out");
    Ok(Json(json!({
        "success": true,
        "message": "You have been logged out"
    })))
}

// ============================================================================
// Profile
// ============================================================================

/// GET /api/profile
pub async fn get_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let user = fetch_user(&state.db, &authed.id).await?;
    let since = member_since(user.created_at.as_deref());

    Ok(Json(json!({
        "user": user,
        "member_since": since,
    })))
}

/// PUT /api/profile
pub async fn update_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    sqlx::query(
        r#"
        UPDATE users
        SET first_name = COALESCE(?, first_name),
            last_name = COALESCE(?, last_name),
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(payload.first_name.as_deref().map(str::trim))
    .bind(payload.last_name.as_deref().map(str::trim))
    .bind(&authed.id)
    .execute(&state.db)
    .await?;

    let user = fetch_user(&state.db, &authed.id).await?;
    info!(user_id = %authed.id, "Profile updated");

    Ok(Json(json!({ "success": true, "user": user })))
}

/// POST /api/auth/change-password
pub async fn change_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = ChangePasswordValidator.validate(&payload);
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        if let Some(message) = first_error(&validation) {
            return Err(ApiError::BadRequest(message));
        }
    }

    let user = fetch_user(&state.db, &authed.id).await?;
    if !verify_password(&payload.current_password, &user.password_hash) {
        warn!(user_id = %authed.id, "Password change rejected: wrong current password");
        return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
    }
    if let Some(message) = first_error(&validation) {
        return Err(ApiError::BadRequest(message));
    }

    let new_hash = hash_or_500(&payload.new_password)?;
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = datetime('now') WHERE id = ?")
        .bind(&new_hash)
        .bind(&authed.id)
        .execute(&state.db)
        .await?;

    info!(user_id = %authed.id, "Password changed");
    Ok(Json(json!({ "success": true })))
}
