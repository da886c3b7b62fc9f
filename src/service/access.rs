//! Access Guard
//!
//! Resolves a bearer credential to an account and enforces role requirements.

use log::debug;
use std::sync::Arc;

use crate::models::{Account, Role};
use crate::repository::AccountRepository;
use crate::service::jwt::JwtService;
use crate::utils::error::{AppError, AppResult};

/// Generic message for every credential failure
pub const CREDENTIALS_ERROR: &str = "Could not validate credentials";

fn unauthorized() -> AppError {
    AppError::Unauthorized(CREDENTIALS_ERROR.to_string())
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[derive(Clone)]
pub struct AccessGuard {
    jwt_service: Arc<JwtService>,
    accounts: Arc<dyn AccountRepository>,
}

impl AccessGuard {
    pub fn new(jwt_service: Arc<JwtService>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self {
            jwt_service,
            accounts,
        }
    }

    /// Resolve the caller from the raw Authorization header value
    ///
    /// Deactivated and unverified accounts still resolve.
    pub async fn identify(&self, authorization: Option<&str>) -> AppResult<Account> {
        let token = authorization.and_then(bearer_token).ok_or_else(unauthorized)?;

        let email = self.jwt_service.validate_access_token(token).map_err(|e| {
            debug!("Rejected access token: {}", e);
            unauthorized()
        })?;

        match self.accounts.find_by_email(&email).await? {
            Some(record) => Ok(Account::from(record)),
            None => {
                debug!("Access token subject {} has no account", email);
                Err(unauthorized())
            }
        }
    }

    /// Fail with Forbidden unless the account holds one of the allowed roles
    pub fn authorize(account: &Account, allowed: &[Role]) -> AppResult<()> {
        if account.has_role(allowed) {
            Ok(())
        } else {
            Err(AppError::Forbidden(Role::requirement_message(allowed)))
        }
    }
}
