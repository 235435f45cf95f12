// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
///
/// Tables are created if missing. `RESET_DB=true` drops everything first.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("⚠️  RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
        info!("✅ Dropped old tables");
    } else {
        info!("ℹ️  Skipping table drop (RESET_DB not set). Tables will be created if they don't exist.");
    }

    create_user_tables(pool).await?;
    create_resume_tables(pool).await?;
    create_job_tables(pool).await?;
    create_message_tables(pool).await?;
    create_system_tables(pool).await?;
    create_indexes(pool).await?;

    init_default_settings(pool).await?;

    info!("✅ Database migration completed successfully!");

    Ok(())
}

/// Seed system settings from environment variables.
/// Existing rows are left untouched.
async fn init_default_settings(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let env_settings = [
        ("openai_api_key", "OPENAI_API_KEY"),
        ("openai_base_url", "OPENAI_BASE_URL"),
        ("openai_model", "OPENAI_MODEL"),
        ("openai_embedding_model", "OPENAI_EMBEDDING_MODEL"),
        ("tavily_api_key", "TAVILY_API_KEY"),
        ("tavily_base_url", "TAVILY_BASE_URL"),
    ];

    for (db_key, env_key) in env_settings {
        if let Ok(value) = env::var(env_key) {
            if value.is_empty() {
                continue;
            }

            let existing: Option<(String,)> =
                sqlx::query_as("SELECT value FROM system_settings WHERE key = ?")
                    .bind(db_key)
                    .fetch_optional(pool)
                    .await?;

            if existing.is_none() {
                sqlx::query(
                    r#"
                    INSERT INTO system_settings (key, value, encrypted, updated_at, updated_by)
                    VALUES (?, ?, 0, datetime('now'), 'system')
                    "#,
                )
                .bind(db_key)
                .bind(&value)
                .execute(pool)
                .await?;

                info!(key = %db_key, "Initialized setting from environment variable");
            }
        }
    }

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Reverse dependency order
    let tables = [
        "embeddings",
        "outreach_messages",
        "related_jobs",
        "job_descriptions",
        "resumes",
        "system_settings",
        "users",
    ];

    for table in tables {
        let _ = sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await;
    }

    Ok(())
}

async fn create_user_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            first_name TEXT,
            last_name TEXT,
            similar_jobs_enabled INTEGER NOT NULL DEFAULT 0,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_resume_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resumes (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            original_text TEXT NOT NULL DEFAULT '',
            tailored_text TEXT,
            latex_source TEXT,
            file_path TEXT,
            file_type TEXT,
            is_tailored INTEGER NOT NULL DEFAULT 0,
            job_description TEXT,
            cover_letters TEXT,
            recommended_skills TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_job_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_descriptions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            company TEXT,
            description_text TEXT NOT NULL,
            requirements TEXT,
            keywords TEXT,
            job_url TEXT,
            location TEXT,
            salary_range TEXT,
            is_target_job INTEGER NOT NULL DEFAULT 1,
            created_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS related_jobs (
            id TEXT PRIMARY KEY,
            parent_job_id TEXT NOT NULL,
            title TEXT NOT NULL,
            company TEXT,
            description_snippet TEXT,
            job_url TEXT,
            location TEXT,
            similarity_score REAL NOT NULL DEFAULT 0,
            source TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(parent_job_id) REFERENCES job_descriptions(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_message_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS outreach_messages (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            job_description_id TEXT NOT NULL,
            message_type TEXT NOT NULL CHECK(message_type IN ('email', 'linkedin', 'pitch')),
            subject TEXT,
            content TEXT NOT NULL,
            tone TEXT NOT NULL DEFAULT 'professional',
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY(job_description_id) REFERENCES job_descriptions(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_system_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS system_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            encrypted INTEGER DEFAULT 0,
            description TEXT,
            updated_at TEXT DEFAULT (datetime('now')),
            updated_by TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Local vector store; vectors are JSON arrays of f32
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS embeddings (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL CHECK(kind IN ('resume', 'job')),
            entity_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            text_preview TEXT NOT NULL DEFAULT '',
            metadata TEXT NOT NULL DEFAULT '{}',
            vector TEXT NOT NULL,
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_resumes_user_created ON resumes(user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_job_descriptions_user ON job_descriptions(user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_related_jobs_parent ON related_jobs(parent_job_id)",
        "CREATE INDEX IF NOT EXISTS idx_outreach_messages_user ON outreach_messages(user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_outreach_messages_job ON outreach_messages(job_description_id)",
        "CREATE INDEX IF NOT EXISTS idx_embeddings_user_kind ON embeddings(user_id, kind)",
    ];

    for statement in indexes {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}
