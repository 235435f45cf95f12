// src/jobs/models.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::common::helpers::parse_json_column;

// ============================================================================
// Job Models
// ============================================================================

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct JobDescription {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub company: Option<String>,
    pub description_text: String,
    pub requirements: Option<String>,
    pub keywords: Option<String>, // JSON array in DB
    pub job_url: Option<String>,
    pub location: Option<String>,
    pub salary_range: Option<String>,
    pub is_target_job: bool,
    pub created_at: Option<String>,
}

impl JobDescription {
    /// Text used for embeddings and similarity
    pub fn search_text(&self) -> String {
        format!("{}\n{}", self.title, self.description_text)
    }
}

// Job with its keyword list parsed
#[derive(Serialize, Debug)]
pub struct JobResponse {
    pub id: String,
    pub title: String,
    pub company: Option<String>,
    pub description_text: String,
    pub requirements: Option<String>,
    pub keywords: Vec<String>,
    pub job_url: Option<String>,
    pub location: Option<String>,
    pub salary_range: Option<String>,
    pub is_target_job: bool,
    pub created_at: Option<String>,
}

impl From<JobDescription> for JobResponse {
    fn from(job: JobDescription) -> Self {
        let keywords = match parse_json_column(job.keywords.as_deref()) {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        JobResponse {
            id: job.id,
            title: job.title,
            company: job.company,
            description_text: job.description_text,
            requirements: job.requirements,
            keywords,
            job_url: job.job_url,
            location: job.location,
            salary_range: job.salary_range,
            is_target_job: job.is_target_job,
            created_at: job.created_at,
        }
    }
}

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct RelatedJob {
    pub id: String,
    pub parent_job_id: String,
    pub title: String,
    pub company: Option<String>,
    pub description_snippet: Option<String>,
    pub job_url: Option<String>,
    pub location: Option<String>,
    pub similarity_score: f64,
    pub source: Option<String>,
    pub created_at: Option<String>,
}

// ============================================================================
// Request Models
// ============================================================================

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CreateJobRequest {
    pub title: String,
    pub company: Option<String>,
    pub description_text: String,
    pub requirements: Option<String>,
    pub job_url: Option<String>,
    pub location: Option<String>,
    pub salary_range: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct JobSearchRequest {
    pub job_title: Option<String>,
    pub location: Option<String>,
}
