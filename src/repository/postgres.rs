//! PostgreSQL repositories

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccountRepository, AidRequestRepository, RepositoryError, RepositoryResult};
use crate::models::{
    Account, AccountRecord, AidRequest, AidStatus, NewAccount, NewAidRequest, PendingToken, Role,
    SingleUseToken,
};

/// Advisory lock key guarding the first-admin insert
const BOOTSTRAP_ADMIN_LOCK_KEY: i64 = 0x6169_645f_6164_6d;

/// Raw `accounts` row with the token columns still flattened
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    full_name: String,
    role: Role,
    password_hash: String,
    is_active: bool,
    email_verified: bool,
    verification_token: Option<String>,
    verification_token_expires: Option<DateTime<Utc>>,
    reset_token: Option<String>,
    reset_token_expires: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for AccountRecord {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let verification = match (row.verification_token, row.verification_token_expires) {
            (Some(value), Some(expires_at)) => Some(SingleUseToken { value, expires_at }),
            (None, None) => None,
            _ => return Err(RepositoryError::InconsistentRow(row.id)),
        };
        let reset = match (row.reset_token, row.reset_token_expires) {
            (Some(value), Some(expires_at)) => Some(SingleUseToken { value, expires_at }),
            (None, None) => None,
            _ => return Err(RepositoryError::InconsistentRow(row.id)),
        };

        let pending_token = match (verification, reset) {
            (Some(token), None) => Some(PendingToken::Verification(token)),
            (None, Some(token)) => Some(PendingToken::Reset(token)),
            (None, None) => None,
            (Some(_), Some(_)) => return Err(RepositoryError::InconsistentRow(row.id)),
        };

        Ok(AccountRecord {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            role: row.role,
            password_hash: row.password_hash,
            is_active: row.is_active,
            email_verified: row.email_verified,
            pending_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Split a pending token into (verification, reset) column values
fn token_columns(token: Option<&PendingToken>) -> (Option<&SingleUseToken>, Option<&SingleUseToken>) {
    match token {
        Some(PendingToken::Verification(t)) => (Some(t), None),
        Some(PendingToken::Reset(t)) => (None, Some(t)),
        None => (None, None),
    }
}

fn map_insert_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some("accounts_email_key") {
            return RepositoryError::DuplicateEmail;
        }
    }
    RepositoryError::Database(err)
}

fn into_record(row: Option<AccountRow>) -> RepositoryResult<Option<AccountRecord>> {
    row.map(AccountRecord::try_from).transpose()
}

/// PostgreSQL implementation of AccountRepository
#[derive(Debug, Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn insert(&self, account: NewAccount) -> RepositoryResult<AccountRecord> {
        let (verification, reset) = token_columns(account.pending_token.as_ref());

        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (
                id, email, password_hash, full_name, role, is_active, email_verified,
                verification_token, verification_token_expires, reset_token, reset_token_expires
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, email, full_name, role, password_hash, is_active, email_verified,
                      verification_token, verification_token_expires, reset_token,
                      reset_token_expires, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.full_name)
        .bind(account.role)
        .bind(account.is_active)
        .bind(account.email_verified)
        .bind(verification.map(|t| t.value.as_str()))
        .bind(verification.map(|t| t.expires_at))
        .bind(reset.map(|t| t.value.as_str()))
        .bind(reset.map(|t| t.expires_at))
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        AccountRecord::try_from(row)
    }

    async fn insert_first_admin(
        &self,
        account: NewAccount,
    ) -> RepositoryResult<Option<AccountRecord>> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent bootstraps until commit
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(BOOTSTRAP_ADMIN_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (
                id, email, password_hash, full_name, role, is_active, email_verified
            )
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE NOT EXISTS (SELECT 1 FROM accounts WHERE role = 'admin')
            RETURNING id, email, full_name, role, password_hash, is_active, email_verified,
                      verification_token, verification_token_expires, reset_token,
                      reset_token_expires, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.full_name)
        .bind(account.role)
        .bind(account.is_active)
        .bind(account.email_verified)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        tx.commit().await?;
        into_record(row)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<AccountRecord>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, full_name, role, password_hash, is_active, email_verified,
                   verification_token, verification_token_expires, reset_token,
                   reset_token_expires, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        into_record(row)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<AccountRecord>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, full_name, role, password_hash, is_active, email_verified,
                   verification_token, verification_token_expires, reset_token,
                   reset_token_expires, created_at, updated_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        into_record(row)
    }

    async fn list_by_role(&self, role: Role) -> RepositoryResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, full_name, role, password_hash, is_active, email_verified,
                   verification_token, verification_token_expires, reset_token,
                   reset_token_expires, created_at, updated_at
            FROM accounts
            WHERE role = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| AccountRecord::try_from(row).map(Account::from))
            .collect()
    }

    async fn admin_exists(&self) -> RepositoryResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM accounts WHERE role = 'admin')",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn set_pending_token(
        &self,
        id: Uuid,
        token: Option<PendingToken>,
    ) -> RepositoryResult<bool> {
        let (verification, reset) = token_columns(token.as_ref());

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET verification_token = $2,
                verification_token_expires = $3,
                reset_token = $4,
                reset_token_expires = $5,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(verification.map(|t| t.value.as_str()))
        .bind(verification.map(|t| t.expires_at))
        .bind(reset.map(|t| t.value.as_str()))
        .bind(reset.map(|t| t.expires_at))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<AccountRecord>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET is_active = TRUE,
                email_verified = TRUE,
                verification_token = NULL,
                verification_token_expires = NULL,
                updated_at = $2
            WHERE verification_token = $1
              AND verification_token_expires > $2
            RETURNING id, email, full_name, role, password_hash, is_active, email_verified,
                      verification_token, verification_token_expires, reset_token,
                      reset_token_expires, created_at, updated_at
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        into_record(row)
    }

    async fn redeem_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<AccountRecord>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET password_hash = $2,
                reset_token = NULL,
                reset_token_expires = NULL,
                updated_at = $3
            WHERE reset_token = $1
              AND reset_token_expires > $3
            RETURNING id, email, full_name, role, password_hash, is_active, email_verified,
                      verification_token, verification_token_expires, reset_token,
                      reset_token_expires, created_at, updated_at
            "#,
        )
        .bind(token)
        .bind(password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        into_record(row)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_manager(&self, id: Uuid) -> RepositoryResult<Option<AccountRecord>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND role = 'manager'
            RETURNING id, email, full_name, role, password_hash, is_active, email_verified,
                      verification_token, verification_token_expires, reset_token,
                      reset_token_expires, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        into_record(row)
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// PostgreSQL implementation of AidRequestRepository
#[derive(Debug, Clone)]
pub struct PgAidRequestRepository {
    pool: PgPool,
}

impl PgAidRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AidRequestRepository for PgAidRequestRepository {
    async fn insert(&self, request: NewAidRequest) -> RepositoryResult<AidRequest> {
        let aid_request = sqlx::query_as::<_, AidRequest>(
            r#"
            INSERT INTO financial_aid_requests (id, student_id, amount, purpose, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, student_id, amount, purpose, status, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.student_id)
        .bind(request.amount)
        .bind(&request.purpose)
        .bind(AidStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        Ok(aid_request)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<AidRequest>> {
        let aid_request = sqlx::query_as::<_, AidRequest>(
            r#"
            SELECT id, student_id, amount, purpose, status, created_at, updated_at
            FROM financial_aid_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(aid_request)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<AidRequest>> {
        let requests = sqlx::query_as::<_, AidRequest>(
            r#"
            SELECT id, student_id, amount, purpose, status, created_at, updated_at
            FROM financial_aid_requests
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn list_by_student(&self, student_id: Uuid) -> RepositoryResult<Vec<AidRequest>> {
        let requests = sqlx::query_as::<_, AidRequest>(
            r#"
            SELECT id, student_id, amount, purpose, status, created_at, updated_at
            FROM financial_aid_requests
            WHERE student_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AidStatus,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<Option<AidRequest>> {
        let aid_request = sqlx::query_as::<_, AidRequest>(
            r#"
            UPDATE financial_aid_requests
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, student_id, amount, purpose, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(aid_request)
    }
}
