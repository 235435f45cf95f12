//! Tests for messages module

#[cfg(test)]
mod tests {
    use super::super::models::*;
    use super::super::*;
    use crate::auth::AuthedUser;
    use crate::common::{generate_job_description_id, ApiError, AppState};
    use crate::services::test_support;
    use axum::extract::{Extension, Json, Path};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    async fn insert_job(state: &Arc<RwLock<AppState>>, user: &AuthedUser) -> String {
        let db = state.read().await.db.clone();
        let id = generate_job_description_id();
        sqlx::query(
            "INSERT INTO job_descriptions (id, user_id, title, company, description_text) VALUES (?, ?, 'Backend Engineer', 'Acme', 'Build APIs in Rust')",
        )
        .bind(&id)
        .bind(&user.id)
        .execute(&db)
        .await
        .unwrap();
        id
    }

    fn generate_body(job_id: &str, message_type: &str) -> GenerateMessageRequest {
        GenerateMessageRequest {
            job_id: Some(job_id.to_string()),
            message_type: Some(message_type.to_string()),
            tone: None,
        }
    }

    #[tokio::test]
    async fn test_generate_validates_input() {
        let (state, _uploads) = test_support::test_state().await;
        let db = state.read().await.db.clone();
        let user = test_support::create_user(&db, "jane").await;
        let other = test_support::create_user(&db, "mallory").await;
        let job_id = insert_job(&state, &user).await;

        let missing = handlers::generate_message(
            Extension(state.clone()),
            user.clone(),
            Json(GenerateMessageRequest::default()),
        )
        .await;
        assert!(matches!(missing, Err(ApiError::BadRequest(msg)) if msg == "Job ID and message type are required"));

        let bad_type = handlers::generate_message(
            Extension(state.clone()),
            user.clone(),
            Json(generate_body(&job_id, "fax")),
        )
        .await;
        assert!(matches!(bad_type, Err(ApiError::BadRequest(_))));

        let foreign = handlers::generate_message(Extension(state), other, Json(generate_body(&job_id, "email"))).await;
        assert!(matches!(foreign, Err(ApiError::NotFound(msg)) if msg == "Job not found"));
    }

    #[tokio::test]
    async fn test_generate_and_manage_message() {
        if test_support::openai_env_configured() {
            return;
        }
        let (state, _uploads) = test_support::test_state().await;
        let db = state.read().await.db.clone();
        let user = test_support::create_user(&db, "jane").await;
        let job_id = insert_job(&state, &user).await;

        let Json(generated) = handlers::generate_message(
            Extension(state.clone()),
            user.clone(),
            Json(generate_body(&job_id, "email")),
        )
        .await
        .unwrap();
        let message_id = generated["message_id"].as_str().unwrap().to_string();
        assert!(message_id.starts_with("M_"));
        assert_eq!(generated["subject"], "Application for Backend Engineer Position");
        assert!(generated["content"].as_str().unwrap().ends_with("Test User"));

        let Json(list) = handlers::list_messages(Extension(state.clone()), user.clone()).await.unwrap();
        assert_eq!(list["messages"][0]["job_title"], "Backend Engineer");
        assert_eq!(list["messages"][0]["tone"], "professional");

        let Json(updated) = handlers::update_message(
            Extension(state.clone()),
            user.clone(),
            Path(message_id.clone()),
            Json(UpdateMessageRequest {
                subject: None,
                content: Some("Edited body".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated["message"]["content"], "Edited body");
        assert_eq!(updated["message"]["subject"], "Application for Backend Engineer Position");

        let Json(copied) = handlers::copy_message(Extension(state.clone()), user.clone(), Path(message_id.clone()))
            .await
            .unwrap();
        assert_eq!(copied["message_type"], "email");
        assert_eq!(copied["content"], "Edited body");

        handlers::delete_message(Extension(state.clone()), user.clone(), Path(message_id.clone()))
            .await
            .unwrap();
        let gone = handlers::get_message(Extension(state), user, Path(message_id)).await;
        assert!(matches!(gone, Err(ApiError::NotFound(msg)) if msg == "Message not found"));
    }

    #[tokio::test]
    async fn test_messages_cascade_with_job() {
        let (state, _uploads) = test_support::test_state().await;
        let db = state.read().await.db.clone();
        let user = test_support::create_user(&db, "jane").await;
        let job_id = insert_job(&state, &user).await;

        handlers::generate_message(Extension(state.clone()), user.clone(), Json(generate_body(&job_id, "pitch")))
            .await
            .unwrap();

        sqlx::query("DELETE FROM job_descriptions WHERE id = ?")
            .bind(&job_id)
            .execute(&db)
            .await
            .unwrap();

        let Json(list) = handlers::list_messages(Extension(state), user).await.unwrap();
        assert_eq!(list["messages"].as_array().unwrap().len(), 0);
    }
}
