// src/resumes/models.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::common::helpers::parse_json_column;

// ============================================================================
// Resume Models
// ============================================================================

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Resume {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub original_text: String,
    pub tailored_text: Option<String>,
    pub latex_source: Option<String>,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub is_tailored: bool,
    pub job_description: Option<String>,
    pub cover_letters: Option<String>, // JSON bundle
    pub recommended_skills: Option<String>, // JSON bundle
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Resume {
    /// Job description when it holds more than whitespace
    pub fn target_description(&self) -> Option<&str> {
        self.job_description
            .as_deref()
            .map(str::trim)
            .filter(|jd| !jd.is_empty())
    }

    /// Tailored text when present, else the uploaded text
    pub fn current_text(&self) -> &str {
        self.tailored_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.original_text)
    }

    /// Tailored, or carrying a job description
    pub fn is_target(&self) -> bool {
        self.is_tailored || self.target_description().is_some()
    }

    /// Title reduced to `[A-Za-z0-9._-]` so it is safe in a
    /// `Content-Disposition` header; anything else becomes `_`
    pub fn download_stem(&self) -> String {
        let stem: String = self
            .title
            .trim()
            .chars()
            .map(|c| match c {
                'A'..='Z' | 'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
                _ => '_',
            })
            .collect();
        let stem = stem.trim_matches(|c| c == '_' || c == '.');
        if stem.is_empty() {
            "resume".to_string()
        } else {
            stem.to_string()
        }
    }
}

/// Resume with its JSON columns parsed
#[derive(Serialize, Debug)]
pub struct ResumeResponse {
    pub id: String,
    pub title: String,
    pub original_text: String,
    pub tailored_text: Option<String>,
    pub latex_source: Option<String>,
    pub file_type: Option<String>,
    pub is_tailored: bool,
    pub job_description: Option<String>,
    pub cover_letters: Value,
    pub recommended_skills: Value,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<Resume> for ResumeResponse {
    fn from(resume: Resume) -> Self {
        ResumeResponse {
            cover_letters: parse_json_column(resume.cover_letters.as_deref()),
            recommended_skills: parse_json_column(resume.recommended_skills.as_deref()),
            id: resume.id,
            title: resume.title,
            original_text: resume.original_text,
            tailored_text: resume.tailored_text,
            latex_source: resume.latex_source,
            file_type: resume.file_type,
            is_tailored: resume.is_tailored,
            job_description: resume.job_description,
            created_at: resume.created_at,
            updated_at: resume.updated_at,
        }
    }
}

// ============================================================================
// Request Models
// ============================================================================

#[derive(Deserialize, Debug, Default)]
pub struct UpdateResumeRequest {
    pub title: Option<String>,
    pub original_text: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct TailorRequest {
    /// Strings are taken as-is; other JSON values are stringified
    pub job_description: Option<Value>,
}

impl TailorRequest {
    pub fn job_description_text(&self) -> Option<String> {
        let text = match self.job_description.as_ref()? {
            Value::Null => return None,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        (!text.trim().is_empty()).then_some(text)
    }
}
