//! Outbound customer notifications.
//!
//! All sends are best effort. Callers log failures and move on; a broken
//! mail path must never roll back an order or block the sweep.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification send failed: {0}")]
    Send(String),
}

/// Delivery channel for customer-facing messages.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Default channel: writes the message to the log. The real mail relay
/// lives in the storefront surface and plugs in through this trait.
#[derive(Debug, Default)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send(&self, recipient: &str, subject: &str, _body: &str) -> Result<(), NotifyError> {
        tracing::info!("Notification to {}: {}", recipient, subject);
        Ok(())
    }
}
