//! Service Layer
//!
//! Business logic for accounts, access control, aid requests and outbound
//! notifications.

pub mod access;
pub mod account;
pub mod aid;
pub mod email_service;
pub mod jwt;
pub mod notification;

// Re-export services
pub use access::AccessGuard;
pub use account::{AccountService, AccountServiceError};
pub use aid::{AidRequestService, AidServiceError};
pub use email_service::{EmailTemplates, SmtpGateway};
pub use jwt::{JwtService, TokenError};
pub use notification::{
    AccountNotifier, LogGateway, MemoryGateway, NotificationGateway, NotificationQueue,
    OutboundEmail,
};
