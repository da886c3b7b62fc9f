//! In-memory repositories
//!
//! Backed by `tokio::sync::RwLock`; every mutating operation runs under a
//! single write lock, which gives the same atomicity as the conditional
//! updates in the PostgreSQL implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountRepository, AidRequestRepository, RepositoryError, RepositoryResult};
use crate::models::{
    Account, AccountRecord, AidRequest, AidStatus, NewAccount, NewAidRequest, PendingToken, Role,
};

fn record_from_new(account: NewAccount) -> AccountRecord {
    let now = Utc::now();
    AccountRecord {
        id: Uuid::new_v4(),
        email: account.email,
        full_name: account.full_name,
        role: account.role,
        password_hash: account.password_hash,
        is_active: account.is_active,
        email_verified: account.email_verified,
        pending_token: account.pending_token,
        created_at: now,
        updated_at: now,
    }
}

/// In-memory implementation of AccountRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryAccountRepository {
    accounts: Arc<RwLock<HashMap<Uuid, AccountRecord>>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert(&self, account: NewAccount) -> RepositoryResult<AccountRecord> {
        let mut accounts = self.accounts.write().await;

        if accounts.values().any(|a| a.email == account.email) {
            return Err(RepositoryError::DuplicateEmail);
        }

        let record = record_from_new(account);
        accounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn insert_first_admin(
        &self,
        account: NewAccount,
    ) -> RepositoryResult<Option<AccountRecord>> {
        let mut accounts = self.accounts.write().await;

        if accounts.values().any(|a| a.role == Role::Admin) {
            return Ok(None);
        }
        if accounts.values().any(|a| a.email == account.email) {
            return Err(RepositoryError::DuplicateEmail);
        }

        let record = record_from_new(account);
        accounts.insert(record.id, record.clone());
        Ok(Some(record))
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<AccountRecord>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<AccountRecord>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn list_by_role(&self, role: Role) -> RepositoryResult<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut result: Vec<Account> = accounts
            .values()
            .filter(|a| a.role == role)
            .map(Account::from)
            .collect();

        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    async fn admin_exists(&self) -> RepositoryResult<bool> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().any(|a| a.role == Role::Admin))
    }

    async fn set_pending_token(
        &self,
        id: Uuid,
        token: Option<PendingToken>,
    ) -> RepositoryResult<bool> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&id) {
            Some(record) => {
                record.pending_token = token;
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<AccountRecord>> {
        let mut accounts = self.accounts.write().await;

        let record = accounts.values_mut().find(|a| {
            a.verification_token()
                .map(|pending| pending.redeems(token, now))
                .unwrap_or(false)
        });

        Ok(record.map(|record| {
            record.pending_token = None;
            record.is_active = true;
            record.email_verified = true;
            record.updated_at = now;
            record.clone()
        }))
    }

    async fn redeem_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<AccountRecord>> {
        let mut accounts = self.accounts.write().await;

        let record = accounts.values_mut().find(|a| {
            a.reset_token()
                .map(|pending| pending.redeems(token, now))
                .unwrap_or(false)
        });

        Ok(record.map(|record| {
            record.pending_token = None;
            record.password_hash = password_hash.to_string();
            record.updated_at = now;
            record.clone()
        }))
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> RepositoryResult<bool> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&id) {
            Some(record) => {
                record.password_hash = password_hash.to_string();
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn deactivate_manager(&self, id: Uuid) -> RepositoryResult<Option<AccountRecord>> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&id) {
            Some(record) if record.role == Role::Manager => {
                record.is_active = false;
                record.updated_at = Utc::now();
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

/// In-memory implementation of AidRequestRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryAidRequestRepository {
    requests: Arc<RwLock<Vec<AidRequest>>>,
}

impl InMemoryAidRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AidRequestRepository for InMemoryAidRequestRepository {
    async fn insert(&self, request: NewAidRequest) -> RepositoryResult<AidRequest> {
        let now = Utc::now();
        let aid_request = AidRequest {
            id: Uuid::new_v4(),
            student_id: request.student_id,
            amount: request.amount,
            purpose: request.purpose,
            status: AidStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.requests.write().await.push(aid_request.clone());
        Ok(aid_request)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<AidRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_all(&self) -> RepositoryResult<Vec<AidRequest>> {
        Ok(self.requests.read().await.clone())
    }

    async fn list_by_student(&self, student_id: Uuid) -> RepositoryResult<Vec<AidRequest>> {
        let requests = self.requests.read().await;
        Ok(requests
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AidStatus,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<Option<AidRequest>> {
        let mut requests = self.requests.write().await;
        Ok(requests.iter_mut().find(|r| r.id == id).map(|request| {
            request.status = status;
            request.updated_at = updated_at;
            request.clone()
        }))
    }
}
