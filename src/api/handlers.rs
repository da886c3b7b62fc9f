//! HTTP Request Handlers
//!
//! Application state plus the service-level and authentication handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::middleware::AuthAccount,
    models::{
        Account, AccessToken, EmailRequest, HealthCheckResponse, LoginRequest, MessageResponse,
        PasswordChangeRequest, PasswordResetRequest, RegisterRequest,
    },
    repository::{AccountRepository, AidRequestRepository},
    service::{
        account::FORGOT_PASSWORD_MESSAGE, AccessGuard, AccountNotifier, AccountService,
        AidRequestService, JwtService,
    },
    utils::error::AppResult,
    VERSION,
};

pub const WELCOME_MESSAGE: &str = "Welcome to Student Financial Aid System API";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<AccountService>,
    pub aid_service: Arc<AidRequestService>,
    pub access_guard: Arc<AccessGuard>,
}

impl AppState {
    /// Wire services over the given repositories
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        requests: Arc<dyn AidRequestRepository>,
        jwt_service: Arc<JwtService>,
        notifier: AccountNotifier,
        bcrypt_cost: u32,
    ) -> Self {
        let account_service =
            AccountService::new(accounts.clone(), jwt_service.clone(), notifier)
                .with_bcrypt_cost(bcrypt_cost);

        Self {
            account_service: Arc::new(account_service),
            aid_service: Arc::new(AidRequestService::new(requests)),
            access_guard: Arc::new(AccessGuard::new(jwt_service, accounts)),
        }
    }
}

/// Root greeting
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new(WELCOME_MESSAGE))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthCheckResponse>> {
    // Check database connectivity
    state.account_service.health_check().await?;

    Ok(Json(HealthCheckResponse {
        status: "healthy".to_string(),
        service: "student-aid-service".to_string(),
        version: VERSION.to_string(),
        database: "connected".to_string(),
    }))
}

/// Register a student or manager account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<Account>> {
    let account = state.account_service.register(request).await?;
    Ok(Json(account))
}

/// Exchange credentials for an access token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AccessToken>> {
    let token = state.account_service.login(request).await?;
    Ok(Json(token))
}

/// Redeem an email verification link
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.account_service.verify_email(&token).await?;
    Ok(Json(MessageResponse::new("Email verified successfully")))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.account_service.forgot_password(request).await?;
    Ok(Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<PasswordResetRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.account_service.reset_password(&token, request).await?;
    Ok(Json(MessageResponse::new("Password reset successfully")))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthAccount(actor): AuthAccount,
    Json(request): Json<PasswordChangeRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.account_service.change_password(&actor, request).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}
