//! Outgoing e-mail
//!
//! Notification e-mails go through a [`Mailer`]. Delivery reports whether a
//! message left the service; it never fails the operation that caused it.

pub mod relay;

pub use relay::HttpMailRelay;

use crate::config::MailConfig;
use crate::domain::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// One outgoing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends a message; `Ok(false)` when the relay declined it
    async fn send(&self, message: &EmailMessage) -> Result<bool>;
}

/// Mailer used when mail is disabled; nothing is ever sent
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, message: &EmailMessage) -> Result<bool> {
        tracing::debug!(to = %message.to, "Mail disabled, message dropped");
        Ok(false)
    }
}

/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn create_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    if !config.enabled {
        return Ok(Arc::new(DisabledMailer));
    }
    Ok(Arc::new(HttpMailRelay::new(config.clone())?))
}
