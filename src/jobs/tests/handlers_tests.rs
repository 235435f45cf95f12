// src/jobs/tests/handlers_tests.rs

#[cfg(test)]
mod tests {
    use crate::auth::AuthedUser;
    use crate::common::{ApiError, AppState};
    use crate::jobs::handlers;
    use crate::jobs::models::*;
    use crate::services::test_support;
    use axum::extract::{Extension, Json, Path};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    const JD: &str = "We are hiring a Senior Rust Engineer to build backend services with PostgreSQL, Docker and AWS. Strong communication skills required.";

    async fn create(state: &Arc<RwLock<AppState>>, user: &AuthedUser, title: &str) -> Value {
        let response = handlers::create_job(
            Extension(state.clone()),
            user.clone(),
            Json(CreateJobRequest {
                title: title.to_string(),
                company: Some("Initech".to_string()),
                description_text: JD.to_string(),
                location: Some("Remote".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_list_get_delete() {
        let (state, _uploads) = test_support::test_state().await;
        let db = state.read().await.db.clone();
        let user = test_support::create_user(&db, "jane").await;
        let other = test_support::create_user(&db, "mallory").await;

        let created = create(&state, &user, "Rust Engineer").await;
        let job_id = created["job"]["id"].as_str().unwrap().to_string();
        assert!(job_id.starts_with("J_"));
        assert!(created["job"]["keywords"]
            .as_array()
            .unwrap()
            .iter()
            .any(|k| k.as_str().map(|s| s.eq_ignore_ascii_case("rust")).unwrap_or(false)));

        let Json(list) = handlers::list_jobs(Extension(state.clone()), user.clone()).await.unwrap();
        assert_eq!(list["jobs"].as_array().unwrap().len(), 1);

        let Json(detail) = handlers::get_job(Extension(state.clone()), user.clone(), Path(job_id.clone()))
            .await
            .unwrap();
        assert_eq!(detail["job"]["title"], "Rust Engineer");
        assert_eq!(detail["related_jobs"], json!([]));

        let foreign = handlers::get_job(Extension(state.clone()), other, Path(job_id.clone())).await;
        assert!(matches!(foreign, Err(ApiError::NotFound(msg)) if msg == "Job not found"));

        let stats = state.read().await.vector_store.user_embeddings_stats(&user.id).await;
        assert_eq!(stats.jobs, 1);

        handlers::delete_job(Extension(state.clone()), user.clone(), Path(job_id.clone()))
            .await
            .unwrap();
        let stats = state.read().await.vector_store.user_embeddings_stats(&user.id).await;
        assert_eq!(stats.jobs, 0);
        assert!(handlers::get_job(Extension(state), user, Path(job_id)).await.is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_missing_description() {
        let (state, _uploads) = test_support::test_state().await;
        let db = state.read().await.db.clone();
        let user = test_support::create_user(&db, "jane").await;

        let result = handlers::create_job(
            Extension(state),
            user,
            Json(CreateJobRequest {
                title: "Engineer".to_string(),
                ..Default::default()
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_search_requires_title() {
        let (state, _uploads) = test_support::test_state().await;
        let db = state.read().await.db.clone();
        let user = test_support::create_user(&db, "jane").await;

        let result = handlers::search_jobs(
            Extension(state),
            user,
            Json(JobSearchRequest {
                job_title: Some("   ".to_string()),
                location: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(msg)) if msg == "Job title is required"));
    }

    #[tokio::test]
    async fn test_analysis_and_related_jobs() {
        let (state, _uploads) = test_support::test_state().await;
        let db = state.read().await.db.clone();
        let user = test_support::create_user(&db, "jane").await;

        let created = create(&state, &user, "Rust Engineer").await;
        let job_id = created["job"]["id"].as_str().unwrap().to_string();

        let Json(analysis) = handlers::analyze_job(Extension(state.clone()), user.clone(), Path(job_id.clone()))
            .await
            .unwrap();
        assert!(!analysis["keywords"].as_array().unwrap().is_empty());
        assert!(analysis["keyword_frequency"].as_array().unwrap().len() <= 20);
        assert_eq!(analysis["matching_resumes"], json!([]));
        assert_eq!(analysis["similar_jobs"], json!([]));

        let Json(related) = handlers::find_related_jobs(Extension(state.clone()), user.clone(), Path(job_id.clone()))
            .await
            .unwrap();
        let related = related["related_jobs"].as_array().unwrap().clone();
        assert!(!related.is_empty());
        assert!(related.len() <= 10);

        let Json(detail) = handlers::get_job(Extension(state.clone()), user.clone(), Path(job_id.clone()))
            .await
            .unwrap();
        assert_eq!(detail["related_jobs"].as_array().unwrap().len(), related.len());

        // Refreshing replaces instead of appending
        handlers::find_related_jobs(Extension(state.clone()), user.clone(), Path(job_id.clone()))
            .await
            .unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM related_jobs WHERE parent_job_id = ?")
            .bind(&job_id)
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count as usize, related.len());

        handlers::delete_job(Extension(state), user, Path(job_id.clone())).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM related_jobs WHERE parent_job_id = ?")
            .bind(&job_id)
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_analysis_lists_other_similar_jobs() {
        let (state, _uploads) = test_support::test_state().await;
        let db = state.read().await.db.clone();
        let user = test_support::create_user(&db, "jane").await;
        let other = test_support::create_user(&db, "john").await;

        let job = create(&state, &user, "Rust Engineer").await;
        let job_id = job["job"]["id"].as_str().unwrap().to_string();
        let sibling = create(&state, &user, "Backend Rust Developer").await;
        let sibling_id = sibling["job"]["id"].as_str().unwrap().to_string();
        create(&state, &other, "Rust Engineer").await;

        let Json(analysis) = handlers::analyze_job(Extension(state.clone()), user.clone(), Path(job_id.clone()))
            .await
            .unwrap();
        let similar = analysis["similar_jobs"].as_array().unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0]["metadata"]["job_id"], sibling_id.as_str());
        assert_eq!(similar[0]["metadata"]["user_id"], user.id.as_str());
        assert!(similar[0]["score"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_legacy_routes_are_gone() {
        let save = handlers::legacy_save_job().await.unwrap_err().into_response();
        assert_eq!(save.status(), StatusCode::GONE);

        let delete = handlers::legacy_delete_job(Path("1".to_string())).await;
        assert!(matches!(delete, Err(ApiError::Gone(msg)) if msg == "Deprecated: manage jobs via resumes UI."));

        let analyze = handlers::legacy_analyze_job(Path("1".to_string())).await;
        assert!(matches!(analyze, Err(ApiError::Gone(msg)) if msg == "Deprecated"));
    }
}
