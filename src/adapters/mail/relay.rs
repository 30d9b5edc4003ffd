//! JSON mail relay client

use super::{EmailMessage, Mailer};
use crate::config::MailConfig;
use crate::domain::{RepositoryError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde_json::json;
use std::time::Duration;

/// Posts messages to an HTTP relay as `{from, to, subject, body, html}`
pub struct HttpMailRelay {
    client: Client,
    config: MailConfig,
}

impl HttpMailRelay {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: MailConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RepositoryError::Notification(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailRelay {
    async fn send(&self, message: &EmailMessage) -> Result<bool> {
        let mut request = self.client.post(&self.config.relay_url).json(&json!({
            "from": self.config.from_address,
            "to": message.to,
            "subject": message.subject,
            "body": message.body,
            "html": message.is_html,
        }));
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key.expose_secret().as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| RepositoryError::Notification(format!("Mail relay unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(to = %message.to, http_status = %status, "Mail relay rejected message");
            return Ok(false);
        }
        Ok(true)
    }
}
