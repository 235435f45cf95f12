// src/resumes/handlers/crud.rs

use crate::auth::AuthedUser;
use crate::common::helpers::secure_filename;
use crate::common::{generate_resume_id, ApiError, AppState, Validator};
use crate::resumes::handlers::fetch_resume;
use crate::resumes::models::{Resume, ResumeResponse, UpdateResumeRequest};
use crate::resumes::validators::{UpdateResumeValidator, MAX_TITLE_LEN};
use crate::services::resume_processor::{
    extract_text_async, validate_resume_content, ContentValidation, DocumentKind,
};
use axum::{
    extract::{multipart::MultipartError, Extension, Multipart, Path},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

const INVALID_TYPE: &str = "Invalid file type. Please upload PDF, DOCX, or TXT files.";

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Uploaded file is too large".to_string())
    } else {
        ApiError::BadRequest(format!("Invalid upload: {}", e.body_text()))
    }
}

/// Stores the file, extracts its text and inserts the resume row.
/// The embedding is best-effort.
pub async fn save_uploaded_resume(
    state: &AppState,
    user_id: &str,
    title: &str,
    filename: &str,
    data: &[u8],
) -> Result<(Resume, ContentValidation), ApiError> {
    if data.len() > state.max_upload_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "File exceeds the {} byte upload limit",
            state.max_upload_bytes
        )));
    }

    let kind = DocumentKind::from_filename(filename)
        .map_err(|_| ApiError::BadRequest(INVALID_TYPE.to_string()))?;

    let resume_id = generate_resume_id();
    let mut safe_name = secure_filename(filename);
    if safe_name.is_empty() {
        safe_name = format!("resume.{}", kind.as_str());
    }

    let user_dir = state.uploads_dir.join(user_id);
    tokio::fs::create_dir_all(&user_dir).await.map_err(|e| {
        warn!(error = %e, user_id = %user_id, "Failed to create upload directory");
        ApiError::InternalServer("Failed to save resume".to_string())
    })?;
    let file_path = user_dir.join(format!("{}_{}", resume_id, safe_name));
    tokio::fs::write(&file_path, data).await.map_err(|e| {
        warn!(error = %e, path = %file_path.display(), "Failed to write resume file");
        ApiError::InternalServer("Failed to save resume".to_string())
    })?;

    let text = match extract_text_async(data.to_vec(), kind).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            let _ = tokio::fs::remove_file(&file_path).await;
            warn!(error = %e, user_id = %user_id, "Resume text extraction failed");
            return Err(ApiError::BadRequest(format!("Error processing file: {}", e)));
        }
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO resumes (id, user_id, title, original_text, file_path, file_type)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&resume_id)
    .bind(user_id)
    .bind(title)
    .bind(&text)
    .bind(file_path.to_string_lossy().to_string())
    .bind(kind.as_str())
    .execute(&state.db)
    .await;
    if let Err(e) = inserted {
        let _ = tokio::fs::remove_file(&file_path).await;
        return Err(e.into());
    }

    let indexed = state
        .vector_store
        .store_resume_embedding(
            &resume_id,
            user_id,
            &text,
            json!({ "title": title, "file_type": kind.as_str() }),
        )
        .await;
    if !indexed {
        warn!(resume_id = %resume_id, "Resume embedding not stored");
    }

    let validation = validate_resume_content(&text);
    let resume = fetch_resume(&state.db, &resume_id, user_id).await?;

    info!(
        user_id = %user_id,
        resume_id = %resume_id,
        file_type = kind.as_str(),
        words = validation.word_count,
        "Resume uploaded"
    );

    Ok((resume, validation))
}

/// POST /api/resumes - Upload a resume (multipart: `title`, `resume_file` or `file`)
pub async fn upload_resume(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    let mut title: Option<String> = None;
    let mut upload: Option<(String, axum::body::Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => {
                title = Some(field.text().await.map_err(multipart_error)?);
            }
            "resume_file" | "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                if !filename.is_empty() && upload.is_none() {
                    upload = Some((filename, data));
                }
            }
            _ => {}
        }
    }

    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Please provide a title for your resume".to_string()))?;
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::ValidationError(format!(
            "title: title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }

    let (filename, data) = upload.ok_or_else(|| {
        ApiError::BadRequest("Please upload a resume file (PDF, DOCX, or TXT).".to_string())
    })?;

    let (resume, validation) =
        save_uploaded_resume(&state, &authed.id, &title, &filename, &data).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "resume": ResumeResponse::from(resume),
            "validation": validation,
        })),
    ))
}

/// GET /api/resumes - The user's resumes, newest first
pub async fn list_resumes(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let resumes = sqlx::query_as::<_, Resume>(
        "SELECT * FROM resumes WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await?;

    let resumes: Vec<ResumeResponse> = resumes.into_iter().map(ResumeResponse::from).collect();
    Ok(Json(json!({ "success": true, "resumes": resumes })))
}

/// GET /api/resumes/targets (alias /api/resumes/jobs) - Tailored resumes or
/// ones carrying a job description
pub async fn list_target_resumes(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let resumes = sqlx::query_as::<_, Resume>(
        "SELECT * FROM resumes WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await?;

    let targets: Vec<ResumeResponse> = resumes
        .into_iter()
        .filter(Resume::is_target)
        .map(ResumeResponse::from)
        .collect();

    Ok(Json(json!({ "success": true, "resumes": targets })))
}

/// GET /api/resumes/:id
pub async fn get_resume(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(resume_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let resume = fetch_resume(&state.db, &resume_id, &authed.id).await?;

    Ok(Json(json!({ "success": true, "resume": ResumeResponse::from(resume) })))
}

/// PUT /api/resumes/:id - Edit title and/or text
pub async fn update_resume(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(resume_id): Path<String>,
    Json(payload): Json<UpdateResumeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    UpdateResumeValidator.validate(&payload).into_result()?;
    let existing = fetch_resume(&state.db, &resume_id, &authed.id).await?;

    sqlx::query(
        r#"
        UPDATE resumes
        SET title = COALESCE(?, title),
            original_text = COALESCE(?, original_text),
            updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(payload.title.as_deref().map(str::trim))
    .bind(payload.original_text.as_deref())
    .bind(&resume_id)
    .bind(&authed.id)
    .execute(&state.db)
    .await?;

    let resume = fetch_resume(&state.db, &resume_id, &authed.id).await?;

    if !resume.is_tailored && resume.original_text != existing.original_text {
        state
            .vector_store
            .store_resume_embedding(
                &resume.id,
                &authed.id,
                &resume.original_text,
                json!({ "title": resume.title, "file_type": resume.file_type }),
            )
            .await;
    }

    info!(user_id = %authed.id, resume_id = %resume_id, "Resume updated");
    Ok(Json(json!({ "success": true, "resume": ResumeResponse::from(resume) })))
}

/// DELETE /api/resumes/:id
pub async fn delete_resume(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(resume_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let resume = fetch_resume(&state.db, &resume_id, &authed.id).await?;

    if let Some(path) = resume.file_path.as_deref() {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(error = %e, resume_id = %resume_id, "Could not remove stored resume file");
        }
    }

    sqlx::query("DELETE FROM resumes WHERE id = ? AND user_id = ?")
        .bind(&resume_id)
        .bind(&authed.id)
        .execute(&state.db)
        .await?;

    state
        .vector_store
        .delete_resume_embedding(&resume_id, &authed.id)
        .await;

    info!(user_id = %authed.id, resume_id = %resume_id, "Resume deleted");
    Ok(Json(json!({ "success": true })))
}
