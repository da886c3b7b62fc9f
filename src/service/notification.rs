//! Notification dispatch
//!
//! Outbound mail is handed to a background worker over a bounded channel.
//! Callers never wait on delivery and delivery failures are only logged, so a
//! broken mail relay can never fail or roll back the operation that queued
//! the message. When the backlog is full new mail is dropped with a warning.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::service::email_service::EmailTemplates;
use crate::utils::error::AppResult;

/// Messages that may wait for the worker before new mail is dropped
pub const NOTIFICATION_QUEUE_CAPACITY: usize = 1024;

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivery backend for outbound mail
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()>;
}

/// Gateway used when no SMTP relay is configured
#[derive(Debug, Default, Clone)]
pub struct LogGateway;

#[async_trait]
impl NotificationGateway for LogGateway {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()> {
        info!("📧 [mail disabled] to={} subject={:?}", to, subject);
        debug!("Mail body for {}: {}", to, html_body);
        Ok(())
    }
}

/// Gateway that keeps every message in memory (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct MemoryGateway {
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far
    pub fn sent(&self) -> Vec<OutboundEmail> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl NotificationGateway for MemoryGateway {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()> {
        let email = OutboundEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        };
        match self.sent.lock() {
            Ok(mut sent) => sent.push(email),
            Err(poisoned) => poisoned.into_inner().push(email),
        }
        Ok(())
    }
}

/// Handle for queueing mail onto the background worker
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<OutboundEmail>,
}

impl NotificationQueue {
    /// Spawn the delivery worker on the current tokio runtime
    pub fn start(gateway: Arc<dyn NotificationGateway>) -> Self {
        Self::with_capacity(gateway, NOTIFICATION_QUEUE_CAPACITY)
    }

    /// Spawn the delivery worker with a custom backlog size
    pub fn with_capacity(gateway: Arc<dyn NotificationGateway>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(run_worker(gateway, receiver));
        Self { sender }
    }

    /// Queue a message; returns immediately
    ///
    /// Returns `false` when the message was dropped.
    pub fn dispatch(&self, email: OutboundEmail) -> bool {
        match self.sender.try_send(email) {
            Ok(()) => true,
            Err(TrySendError::Full(email)) => {
                warn!(
                    "Notification queue is full; dropping {:?} to {}",
                    email.subject, email.to
                );
                false
            }
            Err(TrySendError::Closed(email)) => {
                warn!("Notification worker has stopped; dropping mail to {}", email.to);
                false
            }
        }
    }
}

async fn run_worker(
    gateway: Arc<dyn NotificationGateway>,
    mut receiver: mpsc::Receiver<OutboundEmail>,
) {
    while let Some(email) = receiver.recv().await {
        match gateway.send(&email.to, &email.subject, &email.html_body).await {
            Ok(()) => debug!("Delivered {:?} to {}", email.subject, email.to),
            Err(e) => error!(
                "Failed to deliver {:?} to {}: {}",
                email.subject, email.to, e
            ),
        }
    }
    info!("Notification worker stopped");
}

/// Renders account emails and queues them for delivery
#[derive(Clone)]
pub struct AccountNotifier {
    templates: Arc<EmailTemplates>,
    queue: NotificationQueue,
}

impl AccountNotifier {
    pub fn new(templates: EmailTemplates, queue: NotificationQueue) -> Self {
        Self {
            templates: Arc::new(templates),
            queue,
        }
    }

    pub fn send_verification(&self, to: &str, token: &str) {
        match self.templates.verification_email(to, token) {
            Ok(email) => {
                self.queue.dispatch(email);
            }
            Err(e) => error!("Failed to render verification email for {}: {}", to, e),
        }
    }

    pub fn send_password_reset(&self, to: &str, token: &str) {
        match self.templates.password_reset_email(to, token) {
            Ok(email) => {
                self.queue.dispatch(email);
            }
            Err(e) => error!("Failed to render password reset email for {}: {}", to, e),
        }
    }
}
