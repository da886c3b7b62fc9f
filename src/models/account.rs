//! Account Model
//!
//! Accounts, roles and the single-use tokens attached to an account while a
//! verification or password reset is pending.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::security::{constant_time_compare, generate_url_safe_token};

/// Lifetime of an email verification token
pub const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

/// Lifetime of a password reset token
pub const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Account role. Every account holds exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
            Role::Manager => "manager",
        }
    }

    /// Human readable description of a role requirement, used in 403 responses
    pub fn requirement_message(allowed: &[Role]) -> String {
        match allowed {
            [] => "This action is not permitted".to_string(),
            [only] => format!("This action requires the {} role", only),
            many => {
                let names: Vec<&str> = many.iter().map(Role::as_str).collect();
                format!("This action requires one of the roles: {}", names.join(", "))
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            other => Err(format!(
                "unknown role '{}', expected student, admin or manager",
                other
            )),
        }
    }
}

/// Opaque random string with an expiry, redeemable once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleUseToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl SingleUseToken {
    /// Generate a fresh token valid for `ttl` from now
    pub fn generate(ttl: Duration) -> Self {
        Self::generate_at(Utc::now(), ttl)
    }

    pub fn generate_at(now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value: generate_url_safe_token(),
            expires_at: now + ttl,
        }
    }

    pub fn verification() -> Self {
        Self::generate(Duration::hours(VERIFICATION_TOKEN_TTL_HOURS))
    }

    pub fn password_reset() -> Self {
        Self::generate(Duration::hours(RESET_TOKEN_TTL_HOURS))
    }

    /// A token is redeemable strictly before its expiry instant
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whether `candidate` redeems this token at `now`
    pub fn redeems(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        constant_time_compare(&self.value, candidate) && self.is_valid_at(now)
    }
}

/// The single token an account may have outstanding
///
/// Issuing a reset token replaces a pending verification token and the
/// other way round, so an account never holds both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingToken {
    Verification(SingleUseToken),
    Reset(SingleUseToken),
}


/// Account representation for external API responses
///
/// Never carries the password digest or pending tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(rename = "user_type")]
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}

/// Stored account including credentials
///
/// Used by the repository and service layers only; convert with
/// [`Account::from`] before anything leaves the service.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub password_hash: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub pending_token: Option<PendingToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountRecord {
    pub fn verification_token(&self) -> Option<&SingleUseToken> {
        match &self.pending_token {
            Some(PendingToken::Verification(token)) => Some(token),
            _ => None,
        }
    }

    pub fn reset_token(&self) -> Option<&SingleUseToken> {
        match &self.pending_token {
            Some(PendingToken::Reset(token)) => Some(token),
            _ => None,
        }
    }
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Account {
            id: record.id,
            email: record.email,
            full_name: record.full_name,
            role: record.role,
            is_active: record.is_active,
            email_verified: record.email_verified,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<&AccountRecord> for Account {
    fn from(record: &AccountRecord) -> Self {
        Account::from(record.clone())
    }
}

/// Data required to insert a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub password_hash: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub pending_token: Option<PendingToken>,
}

impl NewAccount {
    /// Self-registered account: inactive and unverified until the token is redeemed
    pub fn self_registered(
        email: String,
        full_name: String,
        role: Role,
        password_hash: String,
        verification: SingleUseToken,
    ) -> Self {
        Self {
            email,
            full_name,
            role,
            password_hash,
            is_active: false,
            email_verified: false,
            pending_token: Some(PendingToken::Verification(verification)),
        }
    }

    /// Admin account created by bootstrap or by another admin
    pub fn pre_verified(email: String, full_name: String, role: Role, password_hash: String) -> Self {
        Self {
            email,
            full_name,
            role,
            password_hash,
            is_active: true,
            email_verified: true,
            pending_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
        let role: Role = serde_json::from_str("\"student\"").unwrap();
        assert_eq!(role, Role::Student);
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" manager ".parse::<Role>().unwrap(), Role::Manager);
        assert!("professor".parse::<Role>().is_err());
    }

    #[test]
    fn test_requirement_message_names_roles() {
        assert_eq!(
            Role::requirement_message(&[Role::Admin]),
            "This action requires the admin role"
        );
        let message = Role::requirement_message(&[Role::Manager, Role::Admin]);
        assert!(message.contains("manager"));
        assert!(message.contains("admin"));
    }

    #[test]
    fn test_single_use_token_expiry_boundary() {
        let now = Utc::now();
        let token = SingleUseToken::generate_at(now, Duration::hours(1));

        assert!(token.is_valid_at(now));
        assert!(token.is_valid_at(now + Duration::minutes(59)));
        assert!(!token.is_valid_at(now + Duration::hours(1)));
        assert!(!token.is_valid_at(now + Duration::hours(2)));
    }

    #[test]
    fn test_single_use_token_redeems_only_exact_value() {
        let now = Utc::now();
        let token = SingleUseToken::generate_at(now, Duration::hours(24));

        assert!(token.redeems(&token.value.clone(), now));
        assert!(!token.redeems("something-else", now));
        assert!(!token.redeems(&token.value.clone(), now + Duration::hours(25)));
    }

    #[test]
    fn test_record_exposes_only_matching_token_kind() {
        let token = SingleUseToken::verification();
        let record = AccountRecord {
            id: Uuid::new_v4(),
            email: "s@example.com".to_string(),
            full_name: "Sam Student".to_string(),
            role: Role::Student,
            password_hash: "$2b$04$hash".to_string(),
            is_active: false,
            email_verified: false,
            pending_token: Some(PendingToken::Verification(token.clone())),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(record.verification_token(), Some(&token));
        assert!(record.reset_token().is_none());
    }

    #[test]
    fn test_account_serializes_role_as_user_type() {
        let account = Account {
            id: Uuid::new_v4(),
            email: "m@example.com".to_string(),
            full_name: "Mia Manager".to_string(),
            role: Role::Manager,
            is_active: true,
            email_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["user_type"], "manager");
        assert!(json.get("password_hash").is_none());
    }
}
