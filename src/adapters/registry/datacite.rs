//! DataCite REST registry
//!
//! Registers DOIs through the JSON:API endpoint `POST /dois` using basic
//! authentication.

use super::traits::{
    IdentifierRegistry, ProviderInfo, RegistrationOutcome, RegistrationTarget,
};
use crate::config::RegistryConfig;
use crate::domain::{GlobalId, IdentifierError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const JSON_API: &str = "application/vnd.api+json";

/// Error title DataCite uses for a DOI that is taken
const TAKEN_MARKER: &str = "has already been taken";

#[derive(Debug, Deserialize)]
struct DoiResponse {
    data: DoiData,
}

#[derive(Debug, Deserialize)]
struct DoiData {
    attributes: DoiAttributes,
}

#[derive(Debug, Deserialize)]
struct DoiAttributes {
    doi: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    title: String,
}

/// DataCite registry client
pub struct DataCiteRegistry {
    base_url: String,
    client: Client,
    config: RegistryConfig,
}

impl DataCiteRegistry {
    /// Builds the HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));
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

    fn request_body(target: &RegistrationTarget) -> Value {
        let creators: Vec<Value> = target
            .creators
            .iter()
            .map(|name| json!({ "name": name }))
            .collect();
        json!({
            "data": {
                "type": "dois",
                "attributes": {
                    "doi": target.global_id.authority_and_identifier(),
                    "event": "register",
                    "url": target.url,
                    "titles": [{ "title": target.title }],
                    "creators": creators,
                    "publisher": target.publisher,
                    "publicationYear": target.publication_year,
                    "types": { "resourceTypeGeneral": "Dataset" }
                }
            }
        })
    }

    fn classify(submitted: &GlobalId, status: StatusCode, body: &str) -> RegistrationOutcome {
        match status {
            StatusCode::CREATED | StatusCode::OK => match serde_json::from_str::<DoiResponse>(body) {
                Ok(resp)
                    if resp
                        .data
                        .attributes
                        .doi
                        .eq_ignore_ascii_case(&submitted.authority_and_identifier()) =>
                {
                    RegistrationOutcome::registered(submitted.clone())
                }
                Ok(resp) => RegistrationOutcome::failed(
                    submitted.clone(),
                    format!("registry echoed {}", resp.data.attributes.doi),
                ),
                Err(e) => RegistrationOutcome::failed(submitted.clone(), format!("unreadable response: {e}")),
            },
            StatusCode::UNPROCESSABLE_ENTITY => {
                let titles: Vec<String> = serde_json::from_str::<ErrorResponse>(body)
                    .map(|r| r.errors.into_iter().map(|e| e.title).collect())
                    .unwrap_or_default();
                let message = if titles.is_empty() { body.to_string() } else { titles.join("; ") };
                if message.contains(TAKEN_MARKER) {
                    RegistrationOutcome::collision(submitted.clone(), message)
                } else {
                    RegistrationOutcome::failed(submitted.clone(), message)
                }
            }
            other => RegistrationOutcome::failed(submitted.clone(), format!("HTTP {other}: {body}")),
        }
    }
}

#[async_trait]
impl IdentifierRegistry for DataCiteRegistry {
    async fn create_identifier(&self, target: &RegistrationTarget) -> Result<RegistrationOutcome> {
        let url = format!("{}/dois", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header_value())
            .header("Content-Type", JSON_API)
            .json(&Self::request_body(target))
            .send()
            .await
            .map_err(|e| IdentifierError::RegistryUnavailable(format!("POST {url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IdentifierError::InvalidResponse(e.to_string()))?;

        let outcome = Self::classify(&target.global_id, status, &body);
        tracing::debug!(
            identifier = %target.global_id,
            http_status = %status,
            outcome = %outcome.status,
            "DataCite registration response"
        );
        Ok(outcome)
    }

    async fn already_exists(&self, global_id: &GlobalId) -> Result<bool> {
        let url = format!("{}/dois/{}", self.base_url, global_id.authority_and_identifier());
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header_value())
            .header("Accept", JSON_API)
            .send()
            .await
            .map_err(|e| IdentifierError::RegistryUnavailable(format!("GET {url}: {e}")))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(IdentifierError::InvalidResponse(format!("GET {url}: HTTP {other}")).into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "datacite",
            base_url: self.base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::registry::traits::RegistrationStatus;

    fn gid() -> GlobalId {
        GlobalId::new("doi", "10.5072", "FK2ABCDEF").unwrap()
    }

    #[test]
    fn test_created_with_echo_is_registered() {
        let body = r#"{"data":{"id":"10.5072/fk2abcdef","attributes":{"doi":"10.5072/fk2abcdef"}}}"#;
        let outcome = DataCiteRegistry::classify(&gid(), StatusCode::CREATED, body);
        assert_eq!(outcome.status, RegistrationStatus::Registered);
    }

    #[test]
    fn test_taken_is_collision() {
        let body = r#"{"errors":[{"source":"doi","title":"This DOI has already been taken"}]}"#;
        let outcome = DataCiteRegistry::classify(&gid(), StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(outcome.status, RegistrationStatus::Collision);
    }

    #[test]
    fn test_other_validation_error_fails() {
        let body = r#"{"errors":[{"source":"url","title":"Is invalid"}]}"#;
        let outcome = DataCiteRegistry::classify(&gid(), StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(outcome.status, RegistrationStatus::Failed);
        assert_eq!(outcome.message.as_deref(), Some("Is invalid"));
    }

    #[test]
    fn test_unauthorized_fails() {
        let outcome = DataCiteRegistry::classify(&gid(), StatusCode::UNAUTHORIZED, "");
        assert_eq!(outcome.status, RegistrationStatus::Failed);
    }

    #[test]
    fn test_request_body_shape() {
        let target = RegistrationTarget {
            global_id: gid(),
            url: "https://data.example.org/dataset.xhtml?persistentId=doi:10.5072/FK2ABCDEF".into(),
            title: "Tide Gauges".into(),
            creators: vec!["Lovelace, Ada".into()],
            publisher: "Example Repository".into(),
            publication_year: 2025,
        };
        let body = DataCiteRegistry::request_body(&target);
        assert_eq!(body["data"]["attributes"]["doi"], "10.5072/FK2ABCDEF");
        assert_eq!(body["data"]["attributes"]["creators"][0]["name"], "Lovelace, Ada");
    }
}
