// src/jobs/handlers/legacy.rs
//
// Retired form endpoints; each answers 410 Gone

use crate::common::ApiError;
use axum::extract::Path;
use axum::Json;

/// POST /jobs/save
pub async fn legacy_save_job() -> Result<Json<serde_json::Value>, ApiError> {
    Err(ApiError::Gone(
        "Deprecated: use resume tailoring to save job descriptions.".to_string(),
    ))
}

/// POST /jobs/delete/:id
pub async fn legacy_delete_job(Path(_job_id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    Err(ApiError::Gone("Deprecated: manage jobs via resumes UI.".to_string()))
}

/// GET /jobs/analyze/:id
pub async fn legacy_analyze_job(Path(_job_id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    Err(ApiError::Gone("Deprecated".to_string()))
}
