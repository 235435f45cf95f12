// src/jobs/handlers/analysis.rs

use crate::auth::AuthedUser;
use crate::common::{generate_related_job_id, ApiError, AppState};
use crate::jobs::handlers::fetch_job;
use crate::jobs::models::RelatedJob;
use crate::services::embeddings::cosine_similarity;
use crate::services::job_scraper::DEFAULT_MAX_RESULTS;
use crate::services::keyword_extractor::{extract_keywords, extract_skills_by_category, keyword_frequency};
use crate::services::vector_store::DEFAULT_SIMILAR_TOP_K;
use axum::extract::{Extension, Json, Path};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

const FREQUENCY_TOP: usize = 20;
const MATCHING_RESUMES_TOP: usize = 3;

/// GET /api/jobs/:id/analysis
pub async fn analyze_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(job_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let job = fetch_job(&state.db, &job_id, &authed.id).await?;

    let keywords = extract_keywords(&job.description_text);
    let skills_by_category = extract_skills_by_category(&job.description_text);
    let frequency: Vec<_> = keyword_frequency(&job.description_text)
        .into_iter()
        .take(FREQUENCY_TOP)
        .map(|(keyword, count)| json!({ "keyword": keyword, "count": count }))
        .collect();

    let matching_resumes = state
        .vector_store
        .find_matching_resumes_for_job(&job.search_text(), &authed.id, MATCHING_RESUMES_TOP)
        .await;

    // One extra so the job itself can be dropped from its own neighbours
    let similar_jobs: Vec<_> = state
        .vector_store
        .find_similar_jobs(&job.search_text(), Some(&authed.id), DEFAULT_SIMILAR_TOP_K + 1)
        .await
        .into_iter()
        .filter(|m| m.metadata.get("job_id").and_then(|v| v.as_str()) != Some(job.id.as_str()))
        .take(DEFAULT_SIMILAR_TOP_K)
        .collect();

    info!(user_id = %authed.id, job_id = %job.id, matches = matching_resumes.len(), "Job analyzed");
    Ok(Json(json!({
        "success": true,
        "keywords": keywords,
        "skills_by_category": skills_by_category,
        "keyword_frequency": frequency,
        "matching_resumes": matching_resumes,
        "similar_jobs": similar_jobs,
    })))
}

/// POST /api/jobs/:id/related - Refresh the stored related postings
pub async fn find_related_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(job_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let job = fetch_job(&state.db, &job_id, &authed.id).await?;

    let postings = state
        .job_scraper
        .search_jobs(&job.title, job.location.as_deref().unwrap_or(""), DEFAULT_MAX_RESULTS)
        .await;

    let job_vector = state.vector_store.embed(&job.search_text()).await;

    let mut scored = Vec::with_capacity(postings.len());
    for posting in postings.into_iter().take(DEFAULT_MAX_RESULTS) {
        let snippet_vector = state
            .vector_store
            .embed(&format!("{}\n{}", posting.title, posting.description_snippet))
            .await;
        let score = cosine_similarity(&job_vector, &snippet_vector) as f64;
        scored.push((posting, score));
    }

    let mut tx = state.db.begin().await?;
    sqlx::query("DELETE FROM related_jobs WHERE parent_job_id = ?")
        .bind(&job.id)
        .execute(&mut *tx)
        .await?;

    let mut related = Vec::with_capacity(scored.len());
    for (posting, score) in scored {
        let id = generate_related_job_id();

        sqlx::query(
            r#"
            INSERT INTO related_jobs
                (id, parent_job_id, title, company, description_snippet, job_url, location, similarity_score, source)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&job.id)
        .bind(&posting.title)
        .bind(&posting.company)
        .bind(&posting.description_snippet)
        .bind(&posting.url)
        .bind(&posting.location)
        .bind(score)
        .bind(&posting.source)
        .execute(&mut *tx)
        .await?;

        related.push(RelatedJob {
            id,
            parent_job_id: job.id.clone(),
            title: posting.title,
            company: Some(posting.company),
            description_snippet: Some(posting.description_snippet),
            job_url: Some(posting.url),
            location: Some(posting.location),
            similarity_score: score,
            source: Some(posting.source),
            created_at: None,
        });
    }
    tx.commit().await?;

    related.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));

    info!(user_id = %authed.id, job_id = %job.id, count = related.len(), "Related jobs stored");
    Ok(Json(json!({ "success": true, "related_jobs": related })))
}
