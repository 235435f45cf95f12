// src/resumes/handlers/mod.rs

pub mod crud;
pub mod rendering;
pub mod tailoring;

pub use crud::*;
pub use rendering::*;
pub use tailoring::*;

use sqlx::SqlitePool;

use super::models::Resume;
use crate::common::ApiError;

/// Loads a resume owned by `user_id`; anyone else's is "not found"
pub async fn fetch_resume(db: &SqlitePool, resume_id: &str, user_id: &str) -> Result<Resume, ApiError> {
    sqlx::query_as::<_, Resume>("SELECT * FROM resumes WHERE id = ? AND user_id = ?")
        .bind(resume_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Resume not found".to_string()))
}
