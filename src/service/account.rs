//! Account Service Implementation
//!
//! Account lifecycle: registration, email verification, login, password
//! recovery and change, admin bootstrap and manager administration.

use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    Account, AccessToken, EmailRequest, LoginRequest, NewAccount, PasswordChangeRequest,
    PasswordResetRequest, PendingToken, RegisterRequest, Role, SingleUseToken,
};
use crate::repository::{AccountRepository, RepositoryError};
use crate::service::jwt::{JwtService, TokenError};
use crate::service::notification::AccountNotifier;
use crate::utils::{
    error::AppError,
    security::{hash_password_with_cost, verify_password, DEFAULT_BCRYPT_COST},
    validation::{describe_validation_errors, normalize_email},
};

/// Response for every forgot-password request, whether or not the email exists
pub const FORGOT_PASSWORD_MESSAGE: &str = "If the email exists, a password reset link has been sent";

/// Custom error types for the account service
#[derive(Error, Debug)]
pub enum AccountServiceError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Admin user already exists. Use admin credentials to create additional admins.")]
    AdminAlreadyExists,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Invalid or expired verification token")]
    InvalidVerificationToken,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Incorrect current password")]
    IncorrectCurrentPassword,

    /// Admin creation requested with a non-admin role
    #[error("User type must be admin")]
    AdminRoleRequired,

    /// Self-registration may not grant the admin role
    #[error("Admin accounts cannot be self-registered")]
    AdminSelfRegistration,

    #[error("{0}")]
    Forbidden(String),

    #[error("Manager not found")]
    ManagerNotFound,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    #[error("Password hashing error: {0}")]
    HashingError(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

impl From<RepositoryError> for AccountServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateEmail => AccountServiceError::EmailAlreadyExists,
            other => AccountServiceError::Repository(other),
        }
    }
}

impl From<AccountServiceError> for AppError {
    fn from(err: AccountServiceError) -> Self {
        let message = err.to_string();
        match err {
            AccountServiceError::EmailAlreadyExists | AccountServiceError::AdminAlreadyExists => {
                AppError::Conflict(message)
            }
            AccountServiceError::InvalidCredentials => AppError::Unauthorized(message),
            AccountServiceError::InvalidVerificationToken
            | AccountServiceError::InvalidResetToken => AppError::InvalidOrExpired(message),
            AccountServiceError::IncorrectCurrentPassword
            | AccountServiceError::AdminRoleRequired
            | AccountServiceError::AdminSelfRegistration => AppError::BadRequest(message),
            AccountServiceError::Forbidden(msg) => AppError::Forbidden(msg),
            AccountServiceError::ManagerNotFound | AccountServiceError::AccountNotFound => {
                AppError::NotFound(message)
            }
            AccountServiceError::ValidationError(msg) => AppError::Validation(msg),
            AccountServiceError::Repository(e) => e.into(),
            AccountServiceError::HashingError(e) => AppError::HashingError(e),
            AccountServiceError::Token(e) => AppError::Internal(e.to_string()),
        }
    }
}

/// Result type for account service operations
pub type AccountServiceResult<T> = Result<T, AccountServiceError>;

fn validate<T: Validate>(request: &T) -> AccountServiceResult<()> {
    request
        .validate()
        .map_err(|e| AccountServiceError::ValidationError(describe_validation_errors(&e)))
}

fn require_role(actor: &Account, allowed: &[Role]) -> AccountServiceResult<()> {
    if actor.has_role(allowed) {
        Ok(())
    } else {
        Err(AccountServiceError::Forbidden(Role::requirement_message(
            allowed,
        )))
    }
}

/// Account lifecycle service
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    jwt_service: Arc<JwtService>,
    notifier: AccountNotifier,

    /// bcrypt cost factor for password hashing (higher = more secure but slower)
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        jwt_service: Arc<JwtService>,
        notifier: AccountNotifier,
    ) -> Self {
        Self {
            accounts,
            jwt_service,
            notifier,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, bcrypt_cost: u32) -> Self {
        self.bcrypt_cost = bcrypt_cost;
        self
    }

    /// Register a student or manager account and email a verification link
    ///
    /// The account stays inactive and unverified until the link is followed.
    pub async fn register(&self, request: RegisterRequest) -> AccountServiceResult<Account> {
        validate(&request)?;
        if request.user_type == Role::Admin {
            return Err(AccountServiceError::AdminSelfRegistration);
        }

        let email = normalize_email(&request.email);
        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(AccountServiceError::EmailAlreadyExists);
        }

        let password_hash = hash_password_with_cost(&request.password, self.bcrypt_cost)?;
        let verification = SingleUseToken::verification();
        let token_value = verification.value.clone();

        let record = self
            .accounts
            .insert(NewAccount::self_registered(
                email,
                request.full_name.trim().to_string(),
                request.user_type,
                password_hash,
                verification,
            ))
            .await?;

        info!("Registered {} account {}", record.role, record.id);
        self.notifier.send_verification(&record.email, &token_value);

        Ok(record.into())
    }

    /// Redeem an email verification token
    pub async fn verify_email(&self, token: &str) -> AccountServiceResult<Account> {
        if token.is_empty() {
            return Err(AccountServiceError::InvalidVerificationToken);
        }

        match self
            .accounts
            .redeem_verification_token(token, Utc::now())
            .await?
        {
            Some(record) => {
                info!("Verified email for account {}", record.id);
                Ok(record.into())
            }
            None => Err(AccountServiceError::InvalidVerificationToken),
        }
    }

    /// Exchange email and password for an access token
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    /// Verification and activation state are not checked.
    pub async fn login(&self, request: LoginRequest) -> AccountServiceResult<AccessToken> {
        validate(&request)?;
        let email = normalize_email(&request.email);

        match self.accounts.find_by_email(&email).await? {
            Some(record) if verify_password(&request.password, &record.password_hash) => {
                Ok(self.jwt_service.issue_access_token(&record.email)?)
            }
            _ => Err(AccountServiceError::InvalidCredentials),
        }
    }

    /// Start password recovery
    ///
    /// Replaces any token pending on the account. The outcome is identical
    /// whether or not the email is registered.
    ///
    /// On an unverified account the reset token displaces the verification
    /// token, and with no way to resend verification that account stays
    /// unverified and inactive from then on.
    pub async fn forgot_password(&self, request: EmailRequest) -> AccountServiceResult<()> {
        validate(&request)?;
        let email = normalize_email(&request.email);

        let record = match self.accounts.find_by_email(&email).await? {
            Some(record) => record,
            None => return Ok(()),
        };

        let reset = SingleUseToken::password_reset();
        let token_value = reset.value.clone();
        self.accounts
            .set_pending_token(record.id, Some(PendingToken::Reset(reset)))
            .await?;

        self.notifier
            .send_password_reset(&record.email, &token_value);
        Ok(())
    }

    /// Redeem a reset token and set a new password
    pub async fn reset_password(
        &self,
        token: &str,
        request: PasswordResetRequest,
    ) -> AccountServiceResult<()> {
        validate(&request)?;
        if token.is_empty() {
            return Err(AccountServiceError::InvalidResetToken);
        }

        let password_hash = hash_password_with_cost(&request.password, self.bcrypt_cost)?;
        match self
            .accounts
            .redeem_reset_token(token, &password_hash, Utc::now())
            .await?
        {
            Some(record) => {
                info!("Password reset for account {}", record.id);
                Ok(())
            }
            None => Err(AccountServiceError::InvalidResetToken),
        }
    }

    /// Change the caller's password after re-checking the current one
    pub async fn change_password(
        &self,
        actor: &Account,
        request: PasswordChangeRequest,
    ) -> AccountServiceResult<()> {
        validate(&request)?;

        let record = self
            .accounts
            .find_by_id(actor.id)
            .await?
            .ok_or(AccountServiceError::AccountNotFound)?;

        if !verify_password(&request.current_password, &record.password_hash) {
            return Err(AccountServiceError::IncorrectCurrentPassword);
        }

        let password_hash = hash_password_with_cost(&request.new_password, self.bcrypt_cost)?;
        if !self
            .accounts
            .update_password_hash(record.id, &password_hash)
            .await?
        {
            return Err(AccountServiceError::AccountNotFound);
        }

        info!("Password changed for account {}", record.id);
        Ok(())
    }

    /// Create the first admin; allowed only while no admin exists
    pub async fn bootstrap_admin(&self, request: RegisterRequest) -> AccountServiceResult<Account> {
        validate(&request)?;

        if self.accounts.admin_exists().await? {
            return Err(AccountServiceError::AdminAlreadyExists);
        }
        if request.user_type != Role::Admin {
            return Err(AccountServiceError::AdminRoleRequired);
        }

        let email = normalize_email(&request.email);
        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(AccountServiceError::EmailAlreadyExists);
        }

        let password_hash = hash_password_with_cost(&request.password, self.bcrypt_cost)?;
        let record = self
            .accounts
            .insert_first_admin(NewAccount::pre_verified(
                email,
                request.full_name.trim().to_string(),
                Role::Admin,
                password_hash,
            ))
            .await?
            .ok_or(AccountServiceError::AdminAlreadyExists)?;

        info!("🔑 Bootstrapped first admin account {}", record.id);
        Ok(record.into())
    }

    /// Create an additional admin; the caller must be an admin
    pub async fn create_admin(
        &self,
        actor: &Account,
        request: RegisterRequest,
    ) -> AccountServiceResult<Account> {
        require_role(actor, &[Role::Admin])?;
        validate(&request)?;
        if request.user_type != Role::Admin {
            return Err(AccountServiceError::AdminRoleRequired);
        }

        let email = normalize_email(&request.email);
        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(AccountServiceError::EmailAlreadyExists);
        }

        let password_hash = hash_password_with_cost(&request.password, self.bcrypt_cost)?;
        let record = self
            .accounts
            .insert(NewAccount::pre_verified(
                email,
                request.full_name.trim().to_string(),
                Role::Admin,
                password_hash,
            ))
            .await?;

        info!("Admin {} created admin account {}", actor.id, record.id);
        Ok(record.into())
    }

    /// Deactivate a manager account; the caller must be an admin
    pub async fn deactivate_manager(
        &self,
        actor: &Account,
        manager_id: Uuid,
    ) -> AccountServiceResult<Account> {
        require_role(actor, &[Role::Admin])?;

        match self.accounts.deactivate_manager(manager_id).await? {
            Some(record) => {
                info!("Admin {} deactivated manager {}", actor.id, record.id);
                Ok(record.into())
            }
            None => {
                warn!("Admin {} tried to deactivate unknown manager {}", actor.id, manager_id);
                Err(AccountServiceError::ManagerNotFound)
            }
        }
    }

    /// List accounts holding a role; the caller must be an admin
    pub async fn list_accounts(
        &self,
        actor: &Account,
        role: Role,
    ) -> AccountServiceResult<Vec<Account>> {
        require_role(actor, &[Role::Admin])?;
        Ok(self.accounts.list_by_role(role).await?)
    }

    pub async fn health_check(&self) -> AccountServiceResult<()> {
        self.accounts.health_check().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RESET_TOKEN_TTL_HOURS;
    use crate::repository::InMemoryAccountRepository;
    use crate::service::email_service::EmailTemplates;
    use crate::service::notification::{MemoryGateway, NotificationQueue, OutboundEmail};
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    const TEST_COST: u32 = 4;
    const SECRET: &str = "account-service-test-secret-value";

    struct Harness {
        service: AccountService,
        repo: Arc<InMemoryAccountRepository>,
        gateway: MemoryGateway,
        jwt: Arc<JwtService>,
    }

    fn harness() -> Harness {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let gateway = MemoryGateway::new();
        let queue = NotificationQueue::start(Arc::new(gateway.clone()));
        let notifier = AccountNotifier::new(
            EmailTemplates::new("http://localhost:8000").unwrap(),
            queue,
        );
        let jwt = Arc::new(JwtService::new(SECRET.to_string()));
        let service =
            AccountService::new(repo.clone(), jwt.clone(), notifier).with_bcrypt_cost(TEST_COST);

        Harness {
            service,
            repo,
            gateway,
            jwt,
        }
    }

    fn register_request(email: &str, role: Role) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            full_name: "Test Person".to_string(),
            user_type: role,
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    async fn wait_for_mail(gateway: &MemoryGateway, count: usize) -> Vec<OutboundEmail> {
        for _ in 0..100 {
            if gateway.sent().len() >= count {
                break;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
        gateway.sent()
    }

    async fn verification_token(h: &Harness, email: &str) -> String {
        h.repo
            .find_by_email(email)
            .await
            .unwrap()
            .and_then(|r| r.verification_token().map(|t| t.value.clone()))
            .expect("verification token pending")
    }

    async fn reset_token(h: &Harness, email: &str) -> String {
        h.repo
            .find_by_email(email)
            .await
            .unwrap()
            .and_then(|r| r.reset_token().map(|t| t.value.clone()))
            .expect("reset token pending")
    }

    async fn bootstrap(h: &Harness) -> Account {
        h.service
            .bootstrap_admin(register_request("root@example.com", Role::Admin))
            .await
            .unwrap()
    }

    // ============================================================================
    // Registration
    // ============================================================================

    #[tokio::test]
    async fn test_register_creates_inactive_unverified_account() {
        let h = harness();
        let account = h
            .service
            .register(register_request("Student@Example.com ", Role::Student))
            .await
            .unwrap();

        assert_eq!(account.email, "student@example.com");
        assert_eq!(account.role, Role::Student);
        assert!(!account.is_active);
        assert!(!account.email_verified);

        let record = h.repo.find_by_email("student@example.com").await.unwrap().unwrap();
        assert_ne!(record.password_hash, "password123");
        let token = record.verification_token().unwrap();
        let ttl = token.expires_at - record.created_at;
        assert!(ttl > Duration::hours(23) && ttl <= Duration::hours(24));
    }

    #[tokio::test]
    async fn test_register_sends_verification_email() {
        let h = harness();
        h.service
            .register(register_request("mail@example.com", Role::Manager))
            .await
            .unwrap();
        let token = verification_token(&h, "mail@example.com").await;

        let sent = wait_for_mail(&h.gateway, 1).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "mail@example.com");
        assert!(sent[0]
            .html_body
            .contains(&format!("/auth/verify-email/{}", token)));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let h = harness();
        h.service
            .register(register_request("dup@example.com", Role::Student))
            .await
            .unwrap();

        let result = h
            .service
            .register(register_request("DUP@example.com", Role::Manager))
            .await;
        assert!(matches!(result, Err(AccountServiceError::EmailAlreadyExists)));
    }

    #[tokio::test]
    async fn test_register_rejects_admin_role() {
        let h = harness();
        let result = h
            .service
            .register(register_request("sneaky@example.com", Role::Admin))
            .await;

        assert!(matches!(result, Err(AccountServiceError::AdminSelfRegistration)));
        assert!(h.repo.find_by_email("sneaky@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let h = harness();
        let mut request = register_request("short@example.com", Role::Student);
        request.password = "1234567".to_string();

        assert!(matches!(
            h.service.register(request).await,
            Err(AccountServiceError::ValidationError(_))
        ));
    }

    // ============================================================================
    // Email verification
    // ============================================================================

    #[tokio::test]
    async fn test_verify_email_activates_account_once() {
        let h = harness();
        h.service
            .register(register_request("v@example.com", Role::Student))
            .await
            .unwrap();
        let token = verification_token(&h, "v@example.com").await;

        let account = h.service.verify_email(&token).await.unwrap();
        assert!(account.is_active);
        assert!(account.email_verified);

        assert!(matches!(
            h.service.verify_email(&token).await,
            Err(AccountServiceError::InvalidVerificationToken)
        ));
    }

    #[tokio::test]
    async fn test_verify_email_rejects_unknown_and_expired_tokens() {
        let h = harness();
        let account = h
            .service
            .register(register_request("exp@example.com", Role::Student))
            .await
            .unwrap();

        assert!(matches!(
            h.service.verify_email("made-up-token").await,
            Err(AccountServiceError::InvalidVerificationToken)
        ));

        let expired = SingleUseToken::generate(Duration::seconds(-1));
        h.repo
            .set_pending_token(account.id, Some(PendingToken::Verification(expired.clone())))
            .await
            .unwrap();

        assert!(matches!(
            h.service.verify_email(&expired.value).await,
            Err(AccountServiceError::InvalidVerificationToken)
        ));
        let record = h.repo.find_by_id(account.id).await.unwrap().unwrap();
        assert!(!record.email_verified);
    }

    // ============================================================================
    // Login
    // ============================================================================

    #[tokio::test]
    async fn test_login_issues_token_for_email() {
        let h = harness();
        h.service
            .register(register_request("login@example.com", Role::Student))
            .await
            .unwrap();

        let token = h
            .service
            .login(login_request("LOGIN@example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(
            h.jwt.validate_access_token(&token.access_token).unwrap(),
            "login@example.com"
        );
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let h = harness();
        h.service
            .register(register_request("who@example.com", Role::Student))
            .await
            .unwrap();

        let wrong_password = h
            .service
            .login(login_request("who@example.com", "wrong-password"))
            .await
            .unwrap_err();
        let unknown_email = h
            .service
            .login(login_request("nobody@example.com", "password123"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AccountServiceError::InvalidCredentials));
    }

    // ============================================================================
    // Password recovery
    // ============================================================================

    #[tokio::test]
    async fn test_forgot_password_unknown_email_is_silent() {
        let h = harness();
        h.service
            .forgot_password(EmailRequest {
                email: "ghost@example.com".to_string(),
            })
            .await
            .unwrap();

        tokio::time::sleep(StdDuration::from_millis(20)).await;
        assert!(h.gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_forgot_password_replaces_verification_token() {
        let h = harness();
        h.service
            .register(register_request("fp@example.com", Role::Student))
            .await
            .unwrap();
        let verification = verification_token(&h, "fp@example.com").await;

        h.service
            .forgot_password(EmailRequest {
                email: "fp@example.com".to_string(),
            })
            .await
            .unwrap();

        let record = h.repo.find_by_email("fp@example.com").await.unwrap().unwrap();
        assert!(record.verification_token().is_none());
        let reset = record.reset_token().unwrap();
        let ttl = reset.expires_at - Utc::now();
        assert!(ttl <= Duration::hours(RESET_TOKEN_TTL_HOURS));
        assert!(ttl > Duration::minutes(59));

        assert!(h.service.verify_email(&verification).await.is_err());
        let record = h.repo.find_by_email("fp@example.com").await.unwrap().unwrap();
        assert!(!record.email_verified);
        assert!(!record.is_active);

        let sent = wait_for_mail(&h.gateway, 2).await;
        assert!(sent
            .iter()
            .any(|m| m.html_body.contains(&format!("/auth/reset-password/{}", reset.value))));
    }

    #[tokio::test]
    async fn test_reset_password_round_trip() {
        let h = harness();
        h.service
            .register(register_request("reset@example.com", Role::Student))
            .await
            .unwrap();
        h.service
            .forgot_password(EmailRequest {
                email: "reset@example.com".to_string(),
            })
            .await
            .unwrap();
        let token = reset_token(&h, "reset@example.com").await;

        h.service
            .reset_password(
                &token,
                PasswordResetRequest {
                    password: "brand-new-password".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(h
            .service
            .login(login_request("reset@example.com", "brand-new-password"))
            .await
            .is_ok());
        assert!(h
            .service
            .login(login_request("reset@example.com", "password123"))
            .await
            .is_err());

        let reuse = h
            .service
            .reset_password(
                &token,
                PasswordResetRequest {
                    password: "another-password".to_string(),
                },
            )
            .await;
        assert!(matches!(reuse, Err(AccountServiceError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_expired_token() {
        let h = harness();
        let account = h
            .service
            .register(register_request("late@example.com", Role::Student))
            .await
            .unwrap();
        let expired = SingleUseToken::generate(Duration::minutes(-1));
        h.repo
            .set_pending_token(account.id, Some(PendingToken::Reset(expired.clone())))
            .await
            .unwrap();

        let result = h
            .service
            .reset_password(
                &expired.value,
                PasswordResetRequest {
                    password: "brand-new-password".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AccountServiceError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn test_change_password() {
        let h = harness();
        let account = h
            .service
            .register(register_request("cp@example.com", Role::Student))
            .await
            .unwrap();

        let wrong = h
            .service
            .change_password(
                &account,
                PasswordChangeRequest {
                    current_password: "not-the-password".to_string(),
                    new_password: "new-password-1".to_string(),
                },
            )
            .await;
        assert!(matches!(wrong, Err(AccountServiceError::IncorrectCurrentPassword)));

        h.service
            .change_password(
                &account,
                PasswordChangeRequest {
                    current_password: "password123".to_string(),
                    new_password: "new-password-1".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(h
            .service
            .login(login_request("cp@example.com", "new-password-1"))
            .await
            .is_ok());
    }

    // ============================================================================
    // Admin bootstrap and administration
    // ============================================================================

    #[tokio::test]
    async fn test_bootstrap_admin_only_once() {
        let h = harness();
        let admin = bootstrap(&h).await;
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.is_active);
        assert!(admin.email_verified);

        let second = h
            .service
            .bootstrap_admin(register_request("second@example.com", Role::Admin))
            .await;
        assert!(matches!(second, Err(AccountServiceError::AdminAlreadyExists)));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_requires_admin_role() {
        let h = harness();
        let result = h
            .service
            .bootstrap_admin(register_request("boot@example.com", Role::Manager))
            .await;
        assert!(matches!(result, Err(AccountServiceError::AdminRoleRequired)));
    }

    #[tokio::test]
    async fn test_create_admin_requires_admin_actor() {
        let h = harness();
        let admin = bootstrap(&h).await;
        let manager = h
            .service
            .register(register_request("m@example.com", Role::Manager))
            .await
            .unwrap();

        let denied = h
            .service
            .create_admin(&manager, register_request("x@example.com", Role::Admin))
            .await;
        assert!(matches!(denied, Err(AccountServiceError::Forbidden(_))));

        let created = h
            .service
            .create_admin(&admin, register_request("second@example.com", Role::Admin))
            .await
            .unwrap();
        assert_eq!(created.role, Role::Admin);
        assert!(created.is_active && created.email_verified);
    }

    #[tokio::test]
    async fn test_deactivate_manager() {
        let h = harness();
        let admin = bootstrap(&h).await;
        let manager = h
            .service
            .register(register_request("mgr@example.com", Role::Manager))
            .await
            .unwrap();
        let student = h
            .service
            .register(register_request("stu@example.com", Role::Student))
            .await
            .unwrap();

        let deactivated = h.service.deactivate_manager(&admin, manager.id).await.unwrap();
        assert!(!deactivated.is_active);

        assert!(matches!(
            h.service.deactivate_manager(&admin, student.id).await,
            Err(AccountServiceError::ManagerNotFound)
        ));
        assert!(matches!(
            h.service.deactivate_manager(&admin, Uuid::new_v4()).await,
            Err(AccountServiceError::ManagerNotFound)
        ));
        assert!(matches!(
            h.service.deactivate_manager(&student, manager.id).await,
            Err(AccountServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_list_accounts_by_role() {
        let h = harness();
        let admin = bootstrap(&h).await;
        h.service
            .register(register_request("m1@example.com", Role::Manager))
            .await
            .unwrap();
        let student = h
            .service
            .register(register_request("s1@example.com", Role::Student))
            .await
            .unwrap();

        let managers = h.service.list_accounts(&admin, Role::Manager).await.unwrap();
        assert_eq!(managers.len(), 1);
        assert_eq!(managers[0].email, "m1@example.com");

        assert!(matches!(
            h.service.list_accounts(&student, Role::Student).await,
            Err(AccountServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            AppError::from(AccountServiceError::EmailAlreadyExists),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(AccountServiceError::InvalidCredentials),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            AppError::from(AccountServiceError::InvalidResetToken),
            AppError::InvalidOrExpired(_)
        ));
        assert!(matches!(
            AppError::from(AccountServiceError::ManagerNotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(AccountServiceError::Repository(RepositoryError::DuplicateEmail)),
            AppError::Conflict(_)
        ));
    }
}
