//! Admin Handlers
//!
//! Admin bootstrap and account administration endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::handlers::AppState;
use super::middleware::AuthAccount;
use crate::models::{Account, MessageResponse, RegisterRequest, Role};
use crate::utils::error::AppResult;

/// Create the first admin; unauthenticated and only usable once
pub async fn create_initial_admin(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Account>)> {
    let account = state.account_service.bootstrap_admin(request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn create_admin(
    State(state): State<AppState>,
    AuthAccount(actor): AuthAccount,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Account>)> {
    let account = state.account_service.create_admin(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn list_managers(
    State(state): State<AppState>,
    AuthAccount(actor): AuthAccount,
) -> AppResult<Json<Vec<Account>>> {
    Ok(Json(
        state
            .account_service
            .list_accounts(&actor, Role::Manager)
            .await?,
    ))
}

pub async fn list_students(
    State(state): State<AppState>,
    AuthAccount(actor): AuthAccount,
) -> AppResult<Json<Vec<Account>>> {
    Ok(Json(
        state
            .account_service
            .list_accounts(&actor, Role::Student)
            .await?,
    ))
}

pub async fn deactivate_manager(
    State(state): State<AppState>,
    AuthAccount(actor): AuthAccount,
    Path(manager_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state
        .account_service
        .deactivate_manager(&actor, manager_id)
        .await?;
    Ok(Json(MessageResponse::new("Manager deactivated successfully")))
}
