// src/jobs/validators.rs

use super::models::*;
use crate::common::{ValidationResult, Validator};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_COMPANY_LEN: usize = 200;

// ============================================================================
// Job Validators
// ============================================================================

pub struct JobValidator;

impl Validator<CreateJobRequest> for JobValidator {
    fn validate(&self, data: &CreateJobRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.title.trim().is_empty() {
            result.add_error("title", "Job title is required");
        } else if data.title.trim().chars().count() > MAX_TITLE_LEN {
            result.add_error(
                "title",
                &format!("Job title must be at most {} characters", MAX_TITLE_LEN),
            );
        }

        if data.description_text.trim().is_empty() {
            result.add_error("description_text", "Job description is required");
        }

        result.max_len("company", data.company.as_deref(), MAX_COMPANY_LEN);

        result
    }
}
