//! Request and Response Models
//!
//! Data structures for API request and response payloads with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::account::Role;
use super::aid_request::AidStatus;
use crate::utils::validation::{email_validator, name_validator};

/// Request payload for registering an account
///
/// Also used for bootstrapping the first admin and for admin-created admins.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "email_validator", message = "Please enter a valid email address"))]
    pub email: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,

    #[validate(custom(
        function = "name_validator",
        message = "Name must contain only letters, spaces, hyphens, apostrophes and periods"
    ))]
    pub full_name: String,

    /// Requested role
    pub user_type: Role,
}

/// Request payload for password login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request payload carrying only an email address
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(custom(function = "email_validator", message = "Please enter a valid email address"))]
    pub email: String,
}

/// Request payload for redeeming a password reset token
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,
}

/// Request payload for changing the caller's password
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordChangeRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub new_password: String,
}

/// Request payload for submitting an aid application
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AidApplicationRequest {
    #[validate(range(min = 1, message = "Amount must be a positive whole number"))]
    pub amount: i64,

    #[validate(length(min = 1, max = 2000, message = "Purpose must be between 1 and 2000 characters"))]
    pub purpose: String,
}

/// Query parameters for a status update
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusQuery {
    pub status: AidStatus,
}

/// Generic confirmation body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response payload
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str, name: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: name.to_string(),
            user_type: Role::Student,
        }
    }

    #[test]
    fn test_register_request_validation() {
        assert!(register("sam@example.com", "password123", "Sam Student")
            .validate()
            .is_ok());
        assert!(register("not-an-email", "password123", "Sam Student")
            .validate()
            .is_err());
        assert!(register("sam@example.com", "short", "Sam Student")
            .validate()
            .is_err());
        assert!(register("sam@example.com", "password123", "")
            .validate()
            .is_err());
    }

    #[test]
    fn test_register_request_rejects_unknown_role() {
        let body = r#"{"email":"a@b.co","password":"password123","full_name":"A B","user_type":"dean"}"#;
        assert!(serde_json::from_str::<RegisterRequest>(body).is_err());
    }

    #[test]
    fn test_aid_application_validation() {
        let ok = AidApplicationRequest {
            amount: 500,
            purpose: "Tuition".to_string(),
        };
        assert!(ok.validate().is_ok());

        let zero = AidApplicationRequest {
            amount: 0,
            purpose: "Tuition".to_string(),
        };
        assert!(zero.validate().is_err());

        let empty_purpose = AidApplicationRequest {
            amount: 10,
            purpose: String::new(),
        };
        assert!(empty_purpose.validate().is_err());
    }

    #[test]
    fn test_password_change_validation() {
        let request = PasswordChangeRequest {
            current_password: "old-password".to_string(),
            new_password: "1234567".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
