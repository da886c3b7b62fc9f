//! Student Aid Service Library
//!
//! A role-based service where students apply for financial aid and managers
//! review the applications. Accounts register with email and password, confirm
//! their address through an emailed link and authenticate with short-lived
//! bearer tokens.
//!
//! # Features
//!
//! - **Account Lifecycle**: registration, email verification, login, password
//!   recovery and change
//! - **Role-Based Access**: student, manager and admin roles enforced on every
//!   protected route
//! - **Aid Requests**: students submit, managers approve or reject
//! - **Fire-and-Forget Email**: outbound mail is queued and never blocks a request
//! - **Flexible Router**: route groups enabled via the RouterBuilder pattern
//! - **Pluggable Storage**: PostgreSQL in production, in-memory for tests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use student_aid_service::{
//!     api::{AppState, RouterBuilder},
//!     repository::{InMemoryAccountRepository, InMemoryAidRequestRepository},
//!     service::{AccountNotifier, EmailTemplates, JwtService, LogGateway, NotificationQueue},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let jwt_service = Arc::new(JwtService::new("a-long-random-secret".to_string()));
//!     let queue = NotificationQueue::start(Arc::new(LogGateway));
//!     let notifier = AccountNotifier::new(EmailTemplates::new("http://localhost:8000")?, queue);
//!
//!     let state = AppState::new(
//!         Arc::new(InMemoryAccountRepository::new()),
//!         Arc::new(InMemoryAidRequestRepository::new()),
//!         jwt_service,
//!         notifier,
//!         12,
//!     );
//!
//!     // Only expose health and authentication endpoints
//!     let app = RouterBuilder::with_public_routes()
//!         .build(state.access_guard.clone())
//!         .with_state(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **API Layer**: HTTP handlers, authentication middleware and route groups
//! - **Service Layer**: account lifecycle, access control, aid review, notifications
//! - **Repository**: persistence traits with PostgreSQL and in-memory backends
//! - **Models**: accounts, aid requests, tokens and request/response types
//! - **Utils**: error handling, password hashing and input validation

/// HTTP API layer with handlers and configurable routing
pub mod api;

/// Configuration loaded from the environment
pub mod config;

/// Database connection management and migrations
pub mod database;

/// Data models and request/response structures
pub mod models;

/// Account and aid request persistence
pub mod repository;

/// Business logic services
pub mod service;

/// Shared utilities for security, validation, and error handling
pub mod utils;

// Re-export commonly used types for convenient access
pub use api::{create_routes, AppState, RouterBuilder};
pub use models::{
    AccessToken, Account, AidRequest, AidStatus, NewAccount, NewAidRequest, PendingToken, Role,
    SingleUseToken,
};
pub use repository::{
    AccountRepository, AidRequestRepository, InMemoryAccountRepository,
    InMemoryAidRequestRepository, PgAccountRepository, PgAidRequestRepository,
};
pub use service::{
    AccessGuard, AccountNotifier, AccountService, AidRequestService, EmailTemplates, JwtService,
    NotificationQueue,
};
pub use utils::error::{AppError, AppResult, ErrorResponse};

// Re-export database utilities for configuration
pub use database::{DatabaseConfig, DatabasePool};

// Re-export configuration system
pub use config::{env, AppConfig, EmailConfig, JwtConfig, SecurityConfig, ServerConfig};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
