// src/jobs/tests/validators_tests.rs

#[cfg(test)]
mod tests {
    use crate::common::Validator;
    use crate::jobs::models::*;
    use crate::jobs::validators::*;

    fn request(title: &str, description: &str) -> CreateJobRequest {
        CreateJobRequest {
            title: title.to_string(),
            description_text: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_job_validator_valid_data() {
        let validator = JobValidator;
        let mut req = request("Backend Engineer", "Build Rust services");
        req.company = Some("Initech".to_string());

        let result = validator.validate(&req);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_job_validator_requires_title_and_description() {
        let validator = JobValidator;
        let result = validator.validate(&request("  ", ""));

        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "title"));
        assert!(result.errors.iter().any(|e| e.field == "description_text"));
    }

    #[test]
    fn test_job_validator_length_limits() {
        let validator = JobValidator;

        let long_title = request(&"x".repeat(MAX_TITLE_LEN + 1), "desc");
        assert!(validator
            .validate(&long_title)
            .errors
            .iter()
            .any(|e| e.field == "title"));

        let mut long_company = request("Engineer", "desc");
        long_company.company = Some("c".repeat(MAX_COMPANY_LEN + 1));
        assert!(validator
            .validate(&long_company)
            .errors
            .iter()
            .any(|e| e.field == "company"));

        let at_limit = request(&"x".repeat(MAX_TITLE_LEN), "desc");
        assert!(validator.validate(&at_limit).is_valid);
    }
}
