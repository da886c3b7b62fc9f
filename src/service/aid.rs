//! Aid Request Service
//!
//! Submission and review of financial aid requests.

use chrono::{DateTime, Duration, Utc};
use log::info;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Account, AidApplicationRequest, AidRequest, AidStatus, NewAidRequest, Role};
use crate::repository::{AidRequestRepository, RepositoryError};
use crate::utils::{error::AppError, validation::describe_validation_errors};

#[derive(Error, Debug)]
pub enum AidServiceError {
    #[error("{0}")]
    Forbidden(String),

    #[error("Application not found")]
    RequestNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<AidServiceError> for AppError {
    fn from(err: AidServiceError) -> Self {
        match err {
            AidServiceError::Forbidden(msg) => AppError::Forbidden(msg),
            AidServiceError::RequestNotFound => {
                AppError::NotFound("Application not found".to_string())
            }
            AidServiceError::ValidationError(msg) => AppError::Validation(msg),
            AidServiceError::Repository(e) => e.into(),
        }
    }
}

pub type AidServiceResult<T> = Result<T, AidServiceError>;

fn require_role(actor: &Account, allowed: &[Role]) -> AidServiceResult<()> {
    if actor.has_role(allowed) {
        Ok(())
    } else {
        Err(AidServiceError::Forbidden(Role::requirement_message(allowed)))
    }
}

/// Next `updated_at` for a record: now, but never earlier than one microsecond
/// past the previous value
fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = previous + Duration::microseconds(1);
    if now > floor {
        now
    } else {
        floor
    }
}

#[derive(Clone)]
pub struct AidRequestService {
    requests: Arc<dyn AidRequestRepository>,
}

impl AidRequestService {
    pub fn new(requests: Arc<dyn AidRequestRepository>) -> Self {
        Self { requests }
    }

    /// Submit a new request owned by the calling student
    pub async fn submit(
        &self,
        actor: &Account,
        request: AidApplicationRequest,
    ) -> AidServiceResult<AidRequest> {
        require_role(actor, &[Role::Student])?;
        request
            .validate()
            .map_err(|e| AidServiceError::ValidationError(describe_validation_errors(&e)))?;

        let aid_request = self
            .requests
            .insert(NewAidRequest {
                student_id: actor.id,
                amount: request.amount,
                purpose: request.purpose.trim().to_string(),
            })
            .await?;

        info!(
            "Student {} submitted aid request {} for {}",
            actor.id, aid_request.id, aid_request.amount
        );
        Ok(aid_request)
    }

    /// The calling student's own requests
    pub async fn list_own(&self, actor: &Account) -> AidServiceResult<Vec<AidRequest>> {
        require_role(actor, &[Role::Student])?;
        Ok(self.requests.list_by_student(actor.id).await?)
    }

    /// One student's requests; students may only look at their own
    pub async fn list_for_student(
        &self,
        actor: &Account,
        student_id: Uuid,
    ) -> AidServiceResult<Vec<AidRequest>> {
        match actor.role {
            Role::Manager | Role::Admin => {}
            Role::Student if actor.id == student_id => {}
            Role::Student => {
                return Err(AidServiceError::Forbidden(
                    "Students can only view their own applications".to_string(),
                ))
            }
        }
        Ok(self.requests.list_by_student(student_id).await?)
    }

    /// Every request in the system; managers only
    pub async fn list_all(&self, actor: &Account) -> AidServiceResult<Vec<AidRequest>> {
        require_role(actor, &[Role::Manager])?;
        Ok(self.requests.list_all().await?)
    }

    /// Set a request's status; managers only
    ///
    /// Any transition is allowed, including back to pending.
    pub async fn update_status(
        &self,
        actor: &Account,
        request_id: Uuid,
        status: AidStatus,
    ) -> AidServiceResult<AidRequest> {
        require_role(actor, &[Role::Manager])?;

        let existing = self
            .requests
            .find_by_id(request_id)
            .await?
            .ok_or(AidServiceError::RequestNotFound)?;

        let updated_at = next_timestamp(existing.updated_at, Utc::now());
        let updated = self
            .requests
            .update_status(request_id, status, updated_at)
            .await?
            .ok_or(AidServiceError::RequestNotFound)?;

        info!(
            "Manager {} set aid request {} from {} to {}",
            actor.id, request_id, existing.status, status
        );
        Ok(updated)
    }
}
