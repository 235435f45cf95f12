// src/messages/validators.rs

use super::models::GenerateMessageRequest;
use crate::common::{ValidationResult, Validator};

pub struct GenerateMessageValidator;

impl Validator<GenerateMessageRequest> for GenerateMessageValidator {
    fn validate(&self, data: &GenerateMessageRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require("job_id", data.job_id.as_deref(), "Job ID and message type are required");
        result.require(
            "message_type",
            data.message_type.as_deref(),
            "Job ID and message type are required",
        );
        result
    }
}
