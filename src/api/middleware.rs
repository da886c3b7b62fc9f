//! Authentication Middleware
//!
//! Resolves the bearer credential on protected routes and exposes the caller
//! to handlers through the [`AuthAccount`] extractor.

use crate::models::Account;
use crate::service::access::{AccessGuard, CREDENTIALS_ERROR};
use crate::utils::error::AppError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Extension type for storing the authenticated account in request extensions
#[derive(Debug, Clone)]
pub struct AuthAccount(pub Account);

/// Authentication middleware
///
/// Looks up the account named by the bearer token and stores it in the
/// request extensions. Missing or invalid credentials short-circuit with
/// 401 and a `WWW-Authenticate: Bearer` challenge.
pub async fn auth_middleware(
    State(guard): State<Arc<AccessGuard>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .map(str::to_owned);

    let account = guard.identify(authorization.as_deref()).await?;
    request.extensions_mut().insert(AuthAccount(account));

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthAccount
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthAccount>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(CREDENTIALS_ERROR.to_string()))
    }
}
