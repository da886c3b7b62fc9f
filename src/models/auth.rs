//! Authentication Models
//!
//! Data structures for JWT access tokens and the authenticated caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims structure for access tokens
///
/// The subject is the account's email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject - account email
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl AccessTokenClaims {
    /// Create new access token claims
    pub fn new(email: &str, expires_at: DateTime<Utc>, issued_at: DateTime<Utc>) -> Self {
        Self {
            sub: email.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
        }
    }
}

/// Access token returned by a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,

    /// Token type (always "bearer")
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl AccessToken {
    pub fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_use_email_subject() {
        let now = Utc::now();
        let claims = AccessTokenClaims::new("a@example.com", now + Duration::minutes(30), now);

        assert_eq!(claims.sub, "a@example.com");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_access_token_type_is_bearer() {
        let token = AccessToken::new("abc".to_string(), 1800);
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["access_token"], "abc");
    }
}
