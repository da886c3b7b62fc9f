//! JWT Authentication Service
//!
//! Issues and validates the stateless access tokens handed out at login.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;

use crate::config::JwtConfig;
use crate::models::{AccessToken, AccessTokenClaims};

/// Access token failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    #[error("Token generation failed: {0}")]
    Generation(String),
}

/// JWT service for access token management and validation
#[derive(Clone)]
pub struct JwtService {
    secret: String,
    algorithm: Algorithm,
    /// Access token expiration duration (default: 30 minutes)
    access_token_expires_in: Duration,
}

impl JwtService {
    /// Create a new JWT service with HS256 and a 30 minute token lifetime
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            algorithm: Algorithm::HS256,
            access_token_expires_in: Duration::minutes(30),
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            algorithm: config.algorithm,
            access_token_expires_in: Duration::minutes(config.access_token_expire_minutes),
        }
    }

    pub fn access_token_expires_in(&self) -> Duration {
        self.access_token_expires_in
    }

    /// Issue an access token for the account with this email
    pub fn issue_access_token(&self, email: &str) -> Result<AccessToken, TokenError> {
        let token = self.issue_token_with_ttl(email, self.access_token_expires_in)?;
        Ok(AccessToken::new(
            token,
            self.access_token_expires_in.num_seconds(),
        ))
    }

    /// Issue a signed token with an explicit lifetime
    pub fn issue_token_with_ttl(&self, email: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Generation("Token expiry out of range".to_string()))?;
        let claims = AccessTokenClaims::new(email, expires_at, now);

        encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Validate an access token and return the subject email
    pub fn validate_access_token(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;

        let claims = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        if claims.sub.is_empty() {
            return Err(TokenError::Invalid);
        }

        Ok(claims.sub)
    }
}
