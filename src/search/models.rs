// src/search/models.rs

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub scope: Option<String>,
}

#[derive(Serialize, Debug, Default, PartialEq, Eq)]
pub struct ProfileStats {
    pub total_resumes: i64,
    pub tailored_resumes: i64,
    pub total_jobs: i64,
    pub total_embeddings: i64,
}
