//! Repository Module
//!
//! Persistence traits for accounts and aid requests with a PostgreSQL
//! implementation and an in-memory implementation for tests and local runs.
//!
//! Token redemption is a single conditional write in both implementations so
//! two concurrent redemptions of the same token cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Account, AccountRecord, AidRequest, AidStatus, NewAccount, NewAidRequest, PendingToken, Role,
};
use crate::utils::error::AppError;

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryAccountRepository, InMemoryAidRequestRepository};
pub use postgres::{PgAccountRepository, PgAidRequestRepository};

/// Errors raised by repository implementations
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Account {0} has inconsistent token columns")]
    InconsistentRow(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateEmail => {
                AppError::Conflict("Email already registered".to_string())
            }
            RepositoryError::InconsistentRow(id) => {
                AppError::Internal(format!("Account {} has inconsistent token columns", id))
            }
            RepositoryError::Database(e) => AppError::Database(e),
        }
    }
}

/// Persistence for accounts and their pending tokens
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account, failing with `DuplicateEmail` if the email is taken
    async fn insert(&self, account: NewAccount) -> RepositoryResult<AccountRecord>;

    /// Insert an admin only if no admin exists yet; `None` when one already does
    async fn insert_first_admin(&self, account: NewAccount)
        -> RepositoryResult<Option<AccountRecord>>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<AccountRecord>>;

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<AccountRecord>>;

    async fn list_by_role(&self, role: Role) -> RepositoryResult<Vec<Account>>;

    async fn admin_exists(&self) -> RepositoryResult<bool>;

    /// Replace whatever token is pending on the account
    async fn set_pending_token(
        &self,
        id: Uuid,
        token: Option<PendingToken>,
    ) -> RepositoryResult<bool>;

    /// Consume a live verification token, marking the account verified and active
    async fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<AccountRecord>>;

    /// Consume a live reset token and store the new password digest
    async fn redeem_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<AccountRecord>>;

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> RepositoryResult<bool>;

    /// Deactivate the account only if it is a manager
    async fn deactivate_manager(&self, id: Uuid) -> RepositoryResult<Option<AccountRecord>>;

    async fn health_check(&self) -> RepositoryResult<()>;
}

/// Persistence for financial aid requests
#[async_trait]
pub trait AidRequestRepository: Send + Sync {
    async fn insert(&self, request: NewAidRequest) -> RepositoryResult<AidRequest>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<AidRequest>>;

    /// All requests, oldest first
    async fn list_all(&self) -> RepositoryResult<Vec<AidRequest>>;

    /// One student's requests, oldest first
    async fn list_by_student(&self, student_id: Uuid) -> RepositoryResult<Vec<AidRequest>>;

    async fn update_status(
        &self,
        id: Uuid,
        status: AidStatus,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<Option<AidRequest>>;
}
