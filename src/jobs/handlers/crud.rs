// src/jobs/handlers/crud.rs

use crate::auth::AuthedUser;
use crate::common::{generate_job_description_id, ApiError, AppState, Validator};
use crate::jobs::handlers::fetch_job;
use crate::jobs::models::{CreateJobRequest, JobDescription, JobResponse, JobSearchRequest, RelatedJob};
use crate::jobs::validators::JobValidator;
use crate::services::job_scraper::DEFAULT_MAX_RESULTS;
use crate::services::keyword_extractor::extract_keywords;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// POST /api/jobs/search - Live postings for a title and location
pub async fn search_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<JobSearchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let job_title = non_blank(payload.job_title)
        .ok_or_else(|| ApiError::BadRequest("Job title is required".to_string()))?;
    let location = non_blank(payload.location).unwrap_or_default();

    let jobs = state
        .job_scraper
        .search_jobs(&job_title, &location, DEFAULT_MAX_RESULTS)
        .await;

    info!(user_id = %authed.id, job_title = %job_title, count = jobs.len(), "Job search");
    Ok(Json(json!({ "success": true, "jobs": jobs })))
}

/// POST /api/jobs - Save a job description
pub async fn create_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    JobValidator.validate(&payload).into_result()?;

    let job_id = generate_job_description_id();
    let title = payload.title.trim().to_string();
    let description = payload.description_text.trim().to_string();
    let keywords = extract_keywords(&description);
    let keywords_json = serde_json::to_string(&keywords).map_err(|e| {
        error!(error = %e, "Failed to serialize keywords");
        ApiError::InternalServer("Failed to save job".to_string())
    })?;

    sqlx::query(
        r#"
        INSERT INTO job_descriptions
            (id, user_id, title, company, description_text, requirements, keywords, job_url, location, salary_range)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&job_id)
    .bind(&authed.id)
    .bind(&title)
    .bind(non_blank(payload.company))
    .bind(&description)
    .bind(non_blank(payload.requirements))
    .bind(&keywords_json)
    .bind(non_blank(payload.job_url))
    .bind(non_blank(payload.location))
    .bind(non_blank(payload.salary_range))
    .execute(&state.db)
    .await?;

    let job = fetch_job(&state.db, &job_id, &authed.id).await?;

    let indexed = state
        .vector_store
        .store_job_embedding(
            &job.id,
            &authed.id,
            &job.search_text(),
            json!({ "title": job.title, "company": job.company }),
        )
        .await;
    if !indexed {
        warn!(job_id = %job.id, "Job embedding not stored");
    }

    info!(user_id = %authed.id, job_id = %job.id, keywords = keywords.len(), "Job saved");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "job": JobResponse::from(job) })),
    ))
}

/// GET /api/jobs - The user's jobs, newest first
pub async fn list_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let jobs = sqlx::query_as::<_, JobDescription>(
        "SELECT * FROM job_descriptions WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await?;

    let jobs: Vec<JobResponse> = jobs.into_iter().map(JobResponse::from).collect();
    Ok(Json(json!({ "success": true, "jobs": jobs })))
}

/// GET /api/jobs/:id - Job plus its stored related jobs
pub async fn get_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(job_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let job = fetch_job(&state.db, &job_id, &authed.id).await?;

    let related_jobs = sqlx::query_as::<_, RelatedJob>(
        "SELECT * FROM related_jobs WHERE parent_job_id = ? ORDER BY similarity_score DESC",
    )
    .bind(&job.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({
        "success": true,
        "job": JobResponse::from(job),
        "related_jobs": related_jobs,
    })))
}

/// DELETE /api/jobs/:id - Related jobs and messages cascade
pub async fn delete_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(job_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let job = fetch_job(&state.db, &job_id, &authed.id).await?;

    sqlx::query("DELETE FROM job_descriptions WHERE id = ? AND user_id = ?")
        .bind(&job.id)
        .bind(&authed.id)
        .execute(&state.db)
        .await?;

    state.vector_store.delete_job_embedding(&job.id, &authed.id).await;

    info!(user_id = %authed.id, job_id = %job.id, "Job deleted");
    Ok(Json(json!({ "success": true })))
}
