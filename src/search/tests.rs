//! Tests for search module

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::services::test_support;
    use axum::extract::{Extension, Json, Query};
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_query_returns_no_results() {
        let (state, _uploads) = test_support::test_state().await;
        let db = state.read().await.db.clone();
        let user = test_support::create_user(&db, "jane").await;

        let Json(body) = handlers::search(
            Extension(state),
            user,
            Query(models::SearchQuery {
                q: Some("  ".to_string()),
                scope: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(body, json!({ "results": [] }));
    }

    #[tokio::test]
    async fn test_search_is_scoped_to_user_and_kind() {
        let (state, _uploads) = test_support::test_state().await;
        let app_state = state.read().await.clone();
        let user = test_support::create_user(&app_state.db, "jane").await;
        let other = test_support::create_user(&app_state.db, "mallory").await;

        let store = &app_state.vector_store;
        store
            .store_resume_embedding("R_1", &user.id, "rust backend engineer postgres", json!({}))
            .await;
        store
            .store_job_embedding("J_1", &user.id, "rust backend role at initech", json!({}))
            .await;
        store
            .store_resume_embedding("R_2", &other.id, "rust backend engineer postgres", json!({}))
            .await;

        let Json(all) = handlers::search(
            Extension(state.clone()),
            user.clone(),
            Query(models::SearchQuery {
                q: Some("rust backend".to_string()),
                scope: None,
            }),
        )
        .await
        .unwrap();
        let results = all["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r["metadata"]["user_id"] == user.id.as_str()));

        let Json(jobs) = handlers::search(
            Extension(state),
            user,
            Query(models::SearchQuery {
                q: Some("rust backend".to_string()),
                scope: Some("job".to_string()),
            }),
        )
        .await
        .unwrap();
        let results = jobs["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["type"], "job");
    }

    #[tokio::test]
    async fn test_profile_stats_counts() {
        let (state, _uploads) = test_support::test_state().await;
        let app_state = state.read().await.clone();
        let user = test_support::create_user(&app_state.db, "jane").await;

        sqlx::query(
            "INSERT INTO resumes (id, user_id, title, original_text, is_tailored) VALUES ('R_A', ?, 'A', 'text', 1), ('R_B', ?, 'B', 'text', 0)",
        )
        .bind(&user.id)
        .bind(&user.id)
        .execute(&app_state.db)
        .await
        .unwrap();
        sqlx::query("INSERT INTO job_descriptions (id, user_id, title, description_text) VALUES ('J_A', ?, 'Role', 'desc')")
            .bind(&user.id)
            .execute(&app_state.db)
            .await
            .unwrap();
        app_state
            .vector_store
            .store_resume_embedding("R_A", &user.id, "resume text", json!({}))
            .await;

        let Json(body) = handlers::profile_stats(Extension(state), user).await.unwrap();
        assert_eq!(
            body["stats"],
            json!({
                "total_resumes": 2,
                "tailored_resumes": 1,
                "total_jobs": 1,
                "total_embeddings": 1,
            })
        );
    }
}
