//! Aid Request Handlers
//!
//! Student submission and manager review endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::handlers::AppState;
use super::middleware::AuthAccount;
use crate::models::{AidApplicationRequest, AidRequest, MessageResponse, UpdateStatusQuery};
use crate::utils::error::AppResult;

/// Submit an aid request as the calling student
pub async fn apply(
    State(state): State<AppState>,
    AuthAccount(actor): AuthAccount,
    Json(request): Json<AidApplicationRequest>,
) -> AppResult<Json<AidRequest>> {
    let aid_request = state.aid_service.submit(&actor, request).await?;
    Ok(Json(aid_request))
}

/// The calling student's own requests
pub async fn list_my_applications(
    State(state): State<AppState>,
    AuthAccount(actor): AuthAccount,
) -> AppResult<Json<Vec<AidRequest>>> {
    Ok(Json(state.aid_service.list_own(&actor).await?))
}

pub async fn list_student_applications(
    State(state): State<AppState>,
    AuthAccount(actor): AuthAccount,
    Path(student_id): Path<Uuid>,
) -> AppResult<Json<Vec<AidRequest>>> {
    Ok(Json(
        state
            .aid_service
            .list_for_student(&actor, student_id)
            .await?,
    ))
}

pub async fn list_all_applications(
    State(state): State<AppState>,
    AuthAccount(actor): AuthAccount,
) -> AppResult<Json<Vec<AidRequest>>> {
    Ok(Json(state.aid_service.list_all(&actor).await?))
}

/// `PUT /managers/applications/{id}/status?status=approved`
pub async fn update_application_status(
    State(state): State<AppState>,
    AuthAccount(actor): AuthAccount,
    Path(request_id): Path<Uuid>,
    Query(query): Query<UpdateStatusQuery>,
) -> AppResult<Json<MessageResponse>> {
    state
        .aid_service
        .update_status(&actor, request_id, query.status)
        .await?;
    Ok(Json(MessageResponse::new(
        "Application status updated successfully",
    )))
}
