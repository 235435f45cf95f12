// src/search/handlers.rs

use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};
use crate::search::models::{ProfileStats, SearchQuery};
use crate::services::vector_store::SearchScope;
use axum::extract::{Extension, Json, Query};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const SEARCH_LIMIT: usize = 10;

/// GET /api/search?q=&type=all|resume|job
pub async fn search(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(params): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let query = params.q.as_deref().map(str::trim).unwrap_or("");
    if query.is_empty() {
        return Ok(Json(json!({ "results": [] })));
    }

    let scope: SearchScope = params
        .scope
        .as_deref()
        .unwrap_or("all")
        .parse()
        .unwrap_or(SearchScope::All);

    let results = state
        .vector_store
        .semantic_search(query, scope, Some(&authed.id), SEARCH_LIMIT)
        .await;

    debug!(user_id = %authed.id, count = results.len(), "Semantic search");
    Ok(Json(json!({ "results": results })))
}

/// GET /api/profile/stats
pub async fn profile_stats(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let (total_resumes, tailored_resumes): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_tailored = 1 THEN 1 ELSE 0 END), 0) FROM resumes WHERE user_id = ?",
    )
    .bind(&authed.id)
    .fetch_one(&state.db)
    .await?;

    let total_jobs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_descriptions WHERE user_id = ?")
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await?;

    let embeddings = state.vector_store.user_embeddings_stats(&authed.id).await;

    let stats = ProfileStats {
        total_resumes,
        tailored_resumes,
        total_jobs,
        total_embeddings: embeddings.resumes + embeddings.jobs,
    };

    Ok(Json(json!({ "success": true, "stats": stats })))
}
