// src/resumes/handlers/tailoring.rs

use crate::auth::handlers::fetch_user;
use crate::auth::AuthedUser;
use crate::common::helpers::{parse_json_column, truncate_chars};
use crate::common::{ApiError, AppState};
use crate::resumes::handlers::fetch_resume;
use crate::resumes::models::{Resume, TailorRequest};
use crate::services::recommended_skills::aggregate_skills_from_web;
use axum::extract::{Extension, Json, Path};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

const SKILL_QUERY_LIMIT: usize = 120;
const SKILL_SEARCH_RESULTS: usize = 5;

fn to_json_string<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| {
        error!(error = %e, "Failed to serialize bundle");
        ApiError::InternalServer("Failed to store results".to_string())
    })
}

/// Resume title, else the first line of the job description
fn skills_query(resume: &Resume, job_description: &str) -> String {
    let title = resume.title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    let first_line = job_description.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    truncate_chars(first_line, SKILL_QUERY_LIMIT)
}

async fn refresh_recommended_skills(state: &AppState, resume: &Resume, job_description: &str) {
    let query = skills_query(resume, job_description);
    if query.is_empty() {
        return;
    }

    let results = state.tavily.search(&query, SKILL_SEARCH_RESULTS).await;
    if results.is_empty() {
        info!(resume_id = %resume.id, "No web results for skill recommendations");
        return;
    }

    let bundle = aggregate_skills_from_web(&results);
    let stored = match serde_json::to_string(&bundle) {
        Ok(raw) => sqlx::query("UPDATE resumes SET recommended_skills = ? WHERE id = ?")
            .bind(raw)
            .bind(&resume.id)
            .execute(&state.db)
            .await
            .map(|_| ()),
        Err(e) => {
            warn!(error = %e, "Failed to serialize recommended skills");
            return;
        }
    };

    match stored {
        Ok(()) => info!(resume_id = %resume.id, skills = bundle.skills.len(), "Recommended skills stored"),
        Err(e) => warn!(error = %e, resume_id = %resume.id, "Failed to store recommended skills"),
    }
}

// ============================================================================
// Tailoring
// ============================================================================

/// POST /api/resumes/:id/tailor
pub async fn tailor_resume(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(resume_id): Path<String>,
    Json(payload): Json<TailorRequest>,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let resume = fetch_resume(&state.db, &resume_id, &authed.id).await?;
    let job_description = payload
        .job_description_text()
        .ok_or_else(|| ApiError::BadRequest("Job description is required".to_string()))?;

    let result = state
        .resume_tailor
        .tailor_resume(&resume.original_text, &job_description)
        .await
        .map_err(|e| {
            error!(error = %e, resume_id = %resume_id, "Tailoring failed");
            ApiError::InternalServer(format!("AI tailoring failed: {}", e))
        })?;

    if !result.tailored_resume.contains("\\documentclass") {
        warn!(resume_id = %resume_id, "Tailored output is not a full LaTeX document");
    }

    sqlx::query(
        r#"
        UPDATE resumes
        SET tailored_text = ?,
            latex_source = ?,
            is_tailored = 1,
            job_description = ?,
            cover_letters = ?,
            updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&result.tailored_resume)
    .bind(&result.tailored_resume)
    .bind(&job_description)
    .bind(to_json_string(&result.cover_letters)?)
    .bind(&resume_id)
    .bind(&authed.id)
    .execute(&state.db)
    .await?;

    let user = fetch_user(&state.db, &authed.id).await?;
    if user.similar_jobs_enabled {
        refresh_recommended_skills(&state, &resume, &job_description).await;
    }

    state
        .vector_store
        .store_resume_embedding(
            &resume_id,
            &authed.id,
            &result.tailored_resume,
            json!({
                "title": resume.title,
                "is_tailored": true,
                "file_type": resume.file_type,
            }),
        )
        .await;

    info!(
        user_id = %authed.id,
        resume_id = %resume_id,
        keywords = result.keywords.len(),
        "Resume tailored"
    );

    Ok(Json(json!({
        "success": true,
        "tailored_resume": result.tailored_resume,
        "latex_source": result.tailored_resume,
        "keywords": result.keywords,
    })))
}

// ============================================================================
// Similar-jobs toggle
// ============================================================================

/// GET /api/profile/similar-jobs-toggle
pub async fn get_similar_jobs_toggle(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let user = fetch_user(&state.db, &authed.id).await?;

    Ok(Json(json!({ "success": true, "enabled": user.similar_jobs_enabled })))
}

/// POST /api/profile/similar-jobs-toggle
pub async fn set_similar_jobs_toggle(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    payload: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let enabled = payload
        .and_then(|Json(body)| body.get("enabled").and_then(Value::as_bool))
        .unwrap_or(false);

    sqlx::query("UPDATE users SET similar_jobs_enabled = ?, updated_at = datetime('now') WHERE id = ?")
        .bind(enabled)
        .bind(&authed.id)
        .execute(&state.db)
        .await?;

    info!(user_id = %authed.id, enabled, "Similar-jobs toggle updated");
    Ok(Json(json!({ "success": true, "enabled": enabled })))
}

// ============================================================================
// Cover letters and recommended skills
// ============================================================================

/// GET /api/resumes/:id/cover-letters
pub async fn get_cover_letters(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(resume_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let resume = fetch_resume(&state.db, &resume_id, &authed.id).await?;

    Ok(Json(json!({
        "success": true,
        "resume_id": resume.id,
        "cover_letters": parse_json_column(resume.cover_letters.as_deref()),
    })))
}

/// POST /api/resumes/:id/cover-letters - Regenerate from the stored job description
pub async fn generate_cover_letters(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(resume_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let resume = fetch_resume(&state.db, &resume_id, &authed.id).await?;

    let resume_text = resume.current_text().trim();
    let job_description = match resume.target_description() {
        Some(jd) if !resume_text.is_empty() => jd,
        _ => {
            return Err(ApiError::BadRequest(
                "Missing job description or resume text for cover letter generation.".to_string(),
            ))
        }
    };

    let bundle = state.cover_letters.generate(resume_text, job_description).await;

    sqlx::query("UPDATE resumes SET cover_letters = ?, updated_at = datetime('now') WHERE id = ?")
        .bind(to_json_string(&bundle)?)
        .bind(&resume.id)
        .execute(&state.db)
        .await?;

    info!(resume_id = %resume.id, versions = bundle.versions.len(), "Cover letters generated");
    Ok(Json(json!({
        "success": true,
        "resume_id": resume.id,
        "cover_letters": bundle,
    })))
}

/// GET /api/resumes/:id/recommended-skills
pub async fn get_recommended_skills(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(resume_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let resume = fetch_resume(&state.db, &resume_id, &authed.id).await?;

    Ok(Json(json!({
        "success": true,
        "recommended_skills": parse_json_column(resume.recommended_skills.as_deref()),
    })))
}
