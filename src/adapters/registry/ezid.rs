//! EZID registry
//!
//! EZID speaks ANVL over plain text: `PUT /id/{pid}` with `name: value`
//! lines, answered by `success: ...` or `error: ...`.

use super::traits::{
    IdentifierRegistry, ProviderInfo, RegistrationOutcome, RegistrationTarget,
};
use crate::config::RegistryConfig;
use crate::domain::{GlobalId, IdentifierError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;

const ANVL_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

/// Percent-escapes the characters ANVL reserves
fn anvl_escape(value: &str, escape_colon: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '\n' => out.push_str("%0A"),
            '\r' => out.push_str("%0D"),
            ':' if escape_colon => out.push_str("%3A"),
            c => out.push(c),
        }
    }
    out
}

/// Renders metadata as ANVL lines
pub fn to_anvl(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{}: {}", anvl_escape(name, true), anvl_escape(value, false)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// EZID registry client
pub struct EzidRegistry {
    base_url: String,
    client: Client,
    config: RegistryConfig,
}

impl EzidRegistry {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new().timeout(Duration::from_secs(config.timeout_seconds));
        if !config.tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(|e| {
            IdentifierError::RegistryUnavailable(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            config,
        })
    }

    fn auth_header_value(&self) -> String {
        let credentials = format!(
            "{}:{}",
            self.config.username,
            self.config.password.expose_secret().as_ref()
        );
        format!("Basic {}", general_purpose::STANDARD.encode(credentials.as_bytes()))
    }

    fn metadata(target: &RegistrationTarget) -> String {
        to_anvl(&[
            ("_target", target.url.clone()),
            ("datacite.title", target.title.clone()),
            ("datacite.creator", target.creators.join("; ")),
            ("datacite.publisher", target.publisher.clone()),
            ("datacite.publicationyear", target.publication_year.to_string()),
            ("datacite.resourcetype", "Dataset".to_string()),
        ])
    }
}

#[async_trait]
impl IdentifierRegistry for EzidRegistry {
    async fn create_identifier(&self, target: &RegistrationTarget) -> Result<RegistrationOutcome> {
        let url = format!("{}/id/{}", self.base_url, target.global_id);
        let response = self
            .client
            .put(&url)
            .header("Authorization", self.auth_header_value())
            .header("Content-Type", ANVL_CONTENT_TYPE)
            .body(Self::metadata(target))
            .send()
            .await
            .map_err(|e| IdentifierError::RegistryUnavailable(format!("PUT {url}: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| IdentifierError::InvalidResponse(e.to_string()))?;

        let outcome = RegistrationOutcome::from_response_text(&target.global_id, &body);
        tracing::debug!(identifier = %target.global_id, outcome = %outcome.status, "EZID registration response");
        Ok(outcome)
    }

    async fn already_exists(&self, global_id: &GlobalId) -> Result<bool> {
        let url = format!("{}/id/{}", self.base_url, global_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IdentifierError::RegistryUnavailable(format!("GET {url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IdentifierError::InvalidResponse(e.to_string()))?;

        match status {
            StatusCode::OK if body.starts_with("success:") => Ok(true),
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => Ok(false),
            other => Err(IdentifierError::InvalidResponse(format!("GET {url}: HTTP {other}: {body}")).into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "ezid",
            base_url: self.base_url.clone(),
        }
    }
}
