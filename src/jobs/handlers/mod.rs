// src/jobs/handlers/mod.rs

pub mod analysis;
pub mod crud;
pub mod legacy;

pub use analysis::*;
pub use crud::*;
pub use legacy::*;

use sqlx::SqlitePool;

use super::models::JobDescription;
use crate::common::ApiError;

/// Loads a job owned by `user_id`
pub async fn fetch_job(db: &SqlitePool, job_id: &str, user_id: &str) -> Result<JobDescription, ApiError> {
    sqlx::query_as::<_, JobDescription>("SELECT * FROM job_descriptions WHERE id = ? AND user_id = ?")
        .bind(job_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Job not found".to_string()))
}
