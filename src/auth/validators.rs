// src/auth/validators.rs

use regex::Regex;
use std::sync::OnceLock;

use super::models::{ChangePasswordRequest, RegisterRequest};
use super::password::MIN_PASSWORD_LEN;
use crate::common::{ValidationResult, Validator};

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap_or_else(|_| unreachable!("static regex"))
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

// ============================================================================
// Registration
// ============================================================================

pub struct RegisterValidator;

impl Validator<RegisterRequest> for RegisterValidator {
    fn validate(&self, data: &RegisterRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        let required = [
            ("username", data.username.as_deref()),
            ("email", data.email.as_deref()),
            ("password", data.password.as_deref()),
            ("confirm_password", data.confirm_password.as_deref()),
        ];
        for (field, value) in required {
            result.require(field, value, "Please fill in all required fields");
        }
        if !result.is_valid {
            return result;
        }

        let password = data.password.as_deref().unwrap_or_default();
        if data.confirm_password.as_deref() != Some(password) {
            result.add_error("confirm_password", "Passwords do not match");
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            result.add_error("password", "Password must be at least 6 characters long");
        }
        if !is_valid_email(data.email.as_deref().unwrap_or_default().trim()) {
            result.add_error("email", "Please enter a valid email address");
        }
        result.max_len("username", data.username.as_deref(), 80);

        result
    }
}

// ============================================================================
// Password change
// ============================================================================

pub struct ChangePasswordValidator;

impl Validator<ChangePasswordRequest> for ChangePasswordValidator {
    fn validate(&self, data: &ChangePasswordRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.current_password.is_empty() || data.new_password.is_empty() {
            result.add_error("password", "Current and new passwords are required");
            return result;
        }
        if data.new_password.chars().count() < MIN_PASSWORD_LEN {
            result.add_error("new_password", "Password must be at least 6 characters long");
        }

        result
    }
}

/// First recorded message, for endpoints that answer with a single error
pub fn first_error(result: &ValidationResult) -> Option<String> {
    result.errors.first().map(|e| e.message.clone())
}
