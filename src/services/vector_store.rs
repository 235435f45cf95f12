// src/services/vector_store.rs
//! Semantic index of resumes and job descriptions, kept in the `embeddings`
//! table and ranked by cosine similarity.
//!
//! Writes report success as a bool and queries return empty results on
//! failure, so callers can treat the index as best-effort.

use serde::Serialize;
use serde_json::{json, Value};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::common::helpers::truncate_chars;
use crate::services::embeddings::{cosine_similarity, is_zero_vector, EmbeddingProvider};

const PREVIEW_CHARS: usize = 200;
pub const DEFAULT_SIMILAR_TOP_K: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingKind {
    Resume,
    Job,
}

impl EmbeddingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingKind::Resume => "resume",
            EmbeddingKind::Job => "job",
        }
    }

    fn id_field(&self) -> &'static str {
        match self {
            EmbeddingKind::Resume => "resume_id",
            EmbeddingKind::Job => "job_id",
        }
    }

    pub fn vector_id(&self, user_id: &str, entity_id: &str) -> String {
        format!("{}_{}_{}", self.as_str(), user_id, entity_id)
    }
}

/// Which kinds a semantic search covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    #[default]
    All,
    Resume,
    Job,
}

impl SearchScope {
    fn kind(&self) -> Option<EmbeddingKind> {
        match self {
            SearchScope::All => None,
            SearchScope::Resume => Some(EmbeddingKind::Resume),
            SearchScope::Job => Some(EmbeddingKind::Job),
        }
    }
}

impl FromStr for SearchScope {
    type Err = std::convert::Infallible;

    /// Unknown values widen to `All`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "resume" => SearchScope::Resume,
            "job" => SearchScope::Job,
            _ => SearchScope::All,
        })
    }
}

/// A stored vector ranked against a query
#[derive(Debug, Clone, Serialize)]
pub struct SimilarMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeMatch {
    pub resume_id: Option<String>,
    pub similarity_score: f32,
    pub text_preview: String,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub score: f32,
    pub preview: String,
    pub metadata: Value,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct EmbeddingStats {
    pub resumes: i64,
    pub jobs: i64,
}

#[derive(Debug, FromRow)]
struct EmbeddingRow {
    id: String,
    kind: String,
    text_preview: String,
    metadata: String,
    vector: String,
}

struct Scored {
    row: EmbeddingRow,
    score: f32,
}

impl Scored {
    fn metadata(&self) -> Value {
        serde_json::from_str(&self.row.metadata).unwrap_or_else(|_| json!({}))
    }
}

#[derive(Clone)]
pub struct VectorStore {
    db: SqlitePool,
    provider: Arc<dyn EmbeddingProvider>,
}

impl VectorStore {
    pub fn new(db: SqlitePool, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { db, provider }
    }

    pub async fn embed(&self, text: &str) -> Vec<f32> {
        self.provider.embed(text).await
    }

    pub async fn store_resume_embedding(
        &self,
        resume_id: &str,
        user_id: &str,
        text: &str,
        extra: Value,
    ) -> bool {
        self.store(EmbeddingKind::Resume, resume_id, user_id, text, extra)
            .await
    }

    pub async fn store_job_embedding(
        &self,
        job_id: &str,
        user_id: &str,
        text: &str,
        extra: Value,
    ) -> bool {
        self.store(EmbeddingKind::Job, job_id, user_id, text, extra).await
    }

    async fn store(
        &self,
        kind: EmbeddingKind,
        entity_id: &str,
        user_id: &str,
        text: &str,
        extra: Value,
    ) -> bool {
        let vector_id = kind.vector_id(user_id, entity_id);

        if text.trim().is_empty() {
            debug!(vector_id = %vector_id, "Skipping embedding: text is empty");
            return false;
        }

        let vector = self.provider.embed(text).await;
        if is_zero_vector(&vector) {
            debug!(vector_id = %vector_id, "Skipping embedding: vector is all zeros");
            return false;
        }

        let preview = truncate_chars(text, PREVIEW_CHARS);
        let mut metadata = serde_json::Map::new();
        metadata.insert("type".into(), json!(kind.as_str()));
        metadata.insert(kind.id_field().into(), json!(entity_id));
        metadata.insert("user_id".into(), json!(user_id));
        metadata.insert("text_preview".into(), json!(preview));
        if let Value::Object(extra) = extra {
            metadata.extend(extra);
        }
        let metadata = Value::Object(metadata);

        let vector_json = match serde_json::to_string(&vector) {
            Ok(v) => v,
            Err(e) => {
                warn!(vector_id = %vector_id, error = %e, "Failed to serialize embedding");
                return false;
            }
        };

        let result = sqlx::query(
            r#"
            INSERT INTO embeddings (id, kind, entity_id, user_id, text_preview, metadata, vector, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                text_preview = excluded.text_preview,
                metadata = excluded.metadata,
                vector = excluded.vector,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&vector_id)
        .bind(kind.as_str())
        .bind(entity_id)
        .bind(user_id)
        .bind(&preview)
        .bind(metadata.to_string())
        .bind(&vector_json)
        .execute(&self.db)
        .await;

        match result {
            Ok(_) => {
                debug!(vector_id = %vector_id, "Embedding stored");
                true
            }
            Err(e) => {
                warn!(vector_id = %vector_id, error = %e, "Failed to store embedding");
                false
            }
        }
    }

    /// Ranks the stored vectors matching the filters against `query`
    async fn rank(
        &self,
        query: &str,
        kind: Option<EmbeddingKind>,
        user_id: Option<&str>,
        top_k: usize,
    ) -> Vec<Scored> {
        let query_vector = self.provider.embed(query).await;
        if is_zero_vector(&query_vector) {
            return Vec::new();
        }

        let rows = sqlx::query_as::<_, EmbeddingRow>(
            r#"
            SELECT id, kind, text_preview, metadata, vector
            FROM embeddings
            WHERE (?1 IS NULL OR kind = ?1) AND (?2 IS NULL OR user_id = ?2)
            "#,
        )
        .bind(kind.map(|k| k.as_str()))
        .bind(user_id)
        .fetch_all(&self.db)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Failed to load embeddings");
                return Vec::new();
            }
        };

        let mut scored: Vec<Scored> = rows
            .into_iter()
            .filter_map(|row| {
                let vector: Vec<f32> = serde_json::from_str(&row.vector).ok()?;
                let score = cosine_similarity(&query_vector, &vector);
                Some(Scored { row, score })
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        scored
    }

    async fn find_similar(
        &self,
        query: &str,
        kind: EmbeddingKind,
        user_id: Option<&str>,
        top_k: usize,
    ) -> Vec<SimilarMatch> {
        self.rank(query, Some(kind), user_id, top_k)
            .await
            .into_iter()
            .map(|s| SimilarMatch {
                metadata: s.metadata(),
                id: s.row.id,
                score: s.score,
            })
            .collect()
    }

    /// Resumes closest to `query`, optionally limited to one user
    pub async fn find_similar_resumes(
        &self,
        query: &str,
        user_id: Option<&str>,
        top_k: usize,
    ) -> Vec<SimilarMatch> {
        self.find_similar(query, EmbeddingKind::Resume, user_id, top_k)
            .await
    }

    /// Job descriptions closest to `query`, optionally limited to one user
    pub async fn find_similar_jobs(
        &self,
        query: &str,
        user_id: Option<&str>,
        top_k: usize,
    ) -> Vec<SimilarMatch> {
        self.find_similar(query, EmbeddingKind::Job, user_id, top_k)
            .await
    }

    /// The user's resumes closest to a job description
    pub async fn find_matching_resumes_for_job(
        &self,
        job_text: &str,
        user_id: &str,
        top_k: usize,
    ) -> Vec<ResumeMatch> {
        self.find_similar_resumes(job_text, Some(user_id), top_k)
            .await
            .into_iter()
            .map(|m| {
                let text_preview = m
                    .metadata
                    .get("text_preview")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                ResumeMatch {
                    resume_id: m
                        .metadata
                        .get("resume_id")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    similarity_score: m.score,
                    text_preview,
                    metadata: m.metadata,
                }
            })
            .collect()
    }

    pub async fn semantic_search(
        &self,
        query: &str,
        scope: SearchScope,
        user_id: Option<&str>,
        top_k: usize,
    ) -> Vec<SearchHit> {
        self.rank(query, scope.kind(), user_id, top_k)
            .await
            .into_iter()
            .map(|s| SearchHit {
                metadata: s.metadata(),
                id: s.row.id,
                kind: s.row.kind,
                score: s.score,
                preview: s.row.text_preview,
            })
            .collect()
    }

    pub async fn delete_resume_embedding(&self, resume_id: &str, user_id: &str) -> bool {
        self.delete(EmbeddingKind::Resume.vector_id(user_id, resume_id))
            .await
    }

    pub async fn delete_job_embedding(&self, job_id: &str, user_id: &str) -> bool {
        self.delete(EmbeddingKind::Job.vector_id(user_id, job_id)).await
    }

    async fn delete(&self, vector_id: String) -> bool {
        match sqlx::query("DELETE FROM embeddings WHERE id = ?")
            .bind(&vector_id)
            .execute(&self.db)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(vector_id = %vector_id, error = %e, "Failed to delete embedding");
                false
            }
        }
    }

    pub async fn user_embeddings_stats(&self, user_id: &str) -> EmbeddingStats {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'resume' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN kind = 'job' THEN 1 ELSE 0 END), 0)
            FROM embeddings
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await;

        match counts {
            Ok((resumes, jobs)) => EmbeddingStats { resumes, jobs },
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to count embeddings");
                EmbeddingStats::default()
            }
        }
    }
}
