// src/services/test_support.rs
//! Shared fixtures for service tests.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::common::migrations::run_migrations;
use crate::services::openai::OpenAIService;
use crate::services::settings::SettingsService;

/// Single-connection pool so every query sees the same in-memory database
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

/// Tests that rely on the model being absent bail out when a key leaks in
/// from the environment
pub fn openai_env_configured() -> bool {
    std::env::var("OPENAI_API_KEY")
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}

pub async fn unconfigured_openai() -> (SqlitePool, Arc<OpenAIService>) {
    let pool = memory_pool().await;
    let settings = Arc::new(SettingsService::with_encryption(pool.clone(), None));
    (pool, Arc::new(OpenAIService::new(settings)))
}

/// App state over a fresh in-memory database, with deterministic
/// embeddings and uploads under a temp dir that lives as long as the guard
pub async fn test_state() -> (
    std::sync::Arc<tokio::sync::RwLock<crate::common::AppState>>,
    tempfile::TempDir,
) {
    use crate::services::embeddings::KeywordEmbeddings;

    let pool = memory_pool().await;
    let settings = Arc::new(SettingsService::with_encryption(pool.clone(), None));
    let mut state = crate::common::AppState::new(
        pool,
        "test_secret".to_string(),
        settings,
        Arc::new(KeywordEmbeddings { dimension: 64 }),
    );

    let uploads = tempfile::tempdir().unwrap();
    state.uploads_dir = uploads.path().to_path_buf();

    (Arc::new(tokio::sync::RwLock::new(state)), uploads)
}

/// Inserts an account and returns it as the extractor would
pub async fn create_user(pool: &SqlitePool, username: &str) -> crate::auth::AuthedUser {
    let id = crate::common::generate_user_id();
    let email = format!("{}@example.com", username);
    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, first_name, last_name) VALUES (?, ?, ?, '!', 'Test', 'User')",
    )
    .bind(&id)
    .bind(username)
    .bind(&email)
    .execute(pool)
    .await
    .unwrap();

    crate::auth::AuthedUser { id, email }
}
