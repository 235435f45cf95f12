// src/messages/handlers.rs

use crate::auth::handlers::fetch_user;
use crate::auth::AuthedUser;
use crate::common::{generate_message_id, ApiError, AppState, Validator};
use crate::jobs::handlers::fetch_job;
use crate::messages::models::{GenerateMessageRequest, MessageWithJob, OutreachMessage, UpdateMessageRequest};
use crate::messages::validators::GenerateMessageValidator;
use crate::services::message_generator::{MessageRequest, MessageType};
use axum::extract::{Extension, Json, Path};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

async fn fetch_message(db: &SqlitePool, message_id: &str, user_id: &str) -> Result<OutreachMessage, ApiError> {
    sqlx::query_as::<_, OutreachMessage>("SELECT * FROM outreach_messages WHERE id = ? AND user_id = ?")
        .bind(message_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))
}

/// POST /api/messages/generate
pub async fn generate_message(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<GenerateMessageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    if !GenerateMessageValidator.validate(&payload).is_valid {
        return Err(ApiError::BadRequest(
            "Job ID and message type are required".to_string(),
        ));
    }
    let job_id = payload.job_id.as_deref().unwrap_or_default().trim();
    let message_type: MessageType = payload
        .message_type
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|e: String| {
            warn!(user_id = %authed.id, error = %e, "Rejected message type");
            ApiError::BadRequest(e)
        })?;
    let tone = payload.tone_or_default();

    let job = fetch_job(&state.db, job_id, &authed.id).await?;
    let user = fetch_user(&state.db, &authed.id).await?;
    let user_name = user.full_name();

    let generated = state
        .message_generator
        .generate_message(&MessageRequest {
            job_description: &job.description_text,
            company: job.company.as_deref().unwrap_or(""),
            job_title: &job.title,
            message_type,
            tone: &tone,
            user_name: &user_name,
        })
        .await;

    let message_id = generate_message_id();
    sqlx::query(
        r#"
        INSERT INTO outreach_messages (id, user_id, job_description_id, message_type, subject, content, tone)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&message_id)
    .bind(&authed.id)
    .bind(&job.id)
    .bind(message_type.as_str())
    .bind(&generated.subject)
    .bind(&generated.content)
    .bind(&tone)
    .execute(&state.db)
    .await?;

    info!(
        user_id = %authed.id,
        message_id = %message_id,
        message_type = %message_type,
        "Outreach message generated"
    );

    Ok(Json(json!({
        "success": true,
        "message_id": message_id,
        "subject": generated.subject,
        "content": generated.content,
        "tips": generated.tips,
    })))
}

/// GET /api/messages - Newest first, with job title and company
pub async fn list_messages(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let messages = sqlx::query_as::<_, MessageWithJob>(
        r#"
        SELECT m.id, m.job_description_id, m.message_type, m.subject, m.content, m.tone,
               m.created_at, m.updated_at, j.title AS job_title, j.company AS company
        FROM outreach_messages m
        LEFT JOIN job_descriptions j ON j.id = m.job_description_id
        WHERE m.user_id = ?
        ORDER BY m.created_at DESC, m.rowid DESC
        "#,
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({ "success": true, "messages": messages })))
}

/// GET /api/messages/:id
pub async fn get_message(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(message_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let message = fetch_message(&state.db, &message_id, &authed.id).await?;

    Ok(Json(json!({ "success": true, "message": message })))
}

/// PUT /api/messages/:id
pub async fn update_message(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(message_id): Path<String>,
    Json(payload): Json<UpdateMessageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    fetch_message(&state.db, &message_id, &authed.id).await?;

    sqlx::query(
        r#"
        UPDATE outreach_messages
        SET subject = COALESCE(?, subject),
            content = COALESCE(?, content),
            updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(payload.subject.as_deref())
    .bind(payload.content.as_deref())
    .bind(&message_id)
    .bind(&authed.id)
    .execute(&state.db)
    .await?;

    let message = fetch_message(&state.db, &message_id, &authed.id).await?;
    info!(user_id = %authed.id, message_id = %message_id, "Message updated");

    Ok(Json(json!({ "success": true, "message": message })))
}

/// DELETE /api/messages/:id
pub async fn delete_message(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(message_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    fetch_message(&state.db, &message_id, &authed.id).await?;

    sqlx::query("DELETE FROM outreach_messages WHERE id = ? AND user_id = ?")
        .bind(&message_id)
        .bind(&authed.id)
        .execute(&state.db)
        .await?;

    info!(user_id = %authed.id, message_id = %message_id, "Message deleted");
    Ok(Json(json!({ "success": true })))
}

/// GET /api/messages/:id/copy - Fields a client puts on the clipboard
pub async fn copy_message(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(message_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let message = fetch_message(&state.db, &message_id, &authed.id).await?;

    Ok(Json(json!({
        "success": true,
        "subject": message.subject,
        "content": message.content,
        "message_type": message.message_type,
    })))
}
