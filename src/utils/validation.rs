//! Validation Utilities
//!
//! Input validation functions for account data and API requests.

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

/// Validates email address format using a comprehensive regex pattern
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email.trim())
}

/// Normalizes email address to lowercase and removes whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates that a full name contains only allowed characters and length
pub fn validate_name(name: &str) -> bool {
    let trimmed = name.trim();

    if trimmed.is_empty() || trimmed.chars().count() > 255 {
        return false;
    }

    // Letters from any script, spaces, hyphens, apostrophes and periods
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NAME_REGEX
        .get_or_init(|| Regex::new(r"^[\p{L}\s\-'.]+$").expect("Failed to compile name regex"));

    regex.is_match(trimmed)
}

/// Custom validator for email fields using the validator crate
pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email"))
    }
}

/// Custom validator for name fields using the validator crate
pub fn name_validator(name: &str) -> Result<(), ValidationError> {
    if validate_name(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_name"))
    }
}

/// Flatten validator errors into a single human readable message
pub fn describe_validation_errors(err: &validator::ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, errors) in err.field_errors() {
        for error in errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for field '{}'", field));
            messages.push(format!("{}: {}", field, message));
        }
    }

    messages.sort();
    messages.join(", ")
}

/// Validation error messages for user-friendly responses
pub mod messages {
    pub const INVALID_EMAIL: &str = "Please enter a valid email address";
    pub const INVALID_NAME: &str =
        "Name must contain only letters, spaces, hyphens, apostrophes and periods";
    pub const PASSWORD_LENGTH: &str = "Password must be between 8 and 128 characters";
}
