// src/resumes/validators.rs

use super::models::UpdateResumeRequest;
use crate::common::{ValidationResult, Validator};

pub const MAX_TITLE_LEN: usize = 200;

pub struct UpdateResumeValidator;

impl Validator<UpdateResumeRequest> for UpdateResumeValidator {
    fn validate(&self, data: &UpdateResumeRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.title.is_none() && data.original_text.is_none() {
            result.add_error("resume", "Provide a title or original_text to update");
            return result;
        }

        if let Some(title) = &data.title {
            if title.trim().is_empty() {
                result.add_error("title", "Title cannot be empty");
            }
        }
        result.max_len("title", data.title.as_deref(), MAX_TITLE_LEN);

        result
    }
}
