//! Identifier registry abstraction
//!
//! Registries answer a registration request with one of three outcomes. The
//! string protocol of text-based registries is turned into the same
//! [`RegistrationOutcome`] at this boundary.

use crate::domain::{GlobalId, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker a text registry returns when the identifier is taken
pub const ALREADY_EXISTS_MARKER: &str = "identifier already exists";

/// How a registration request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// The registry echoed the submitted identifier
    Registered,
    /// The identifier is already in use at the registry
    Collision,
    /// Anything else; not retried
    Failed,
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Collision => "collision",
            RegistrationStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Registry answer to one registration request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub status: RegistrationStatus,
    /// The identifier that was submitted
    pub identifier: GlobalId,
    /// Raw registry message, kept for logs
    pub message: Option<String>,
}

impl RegistrationOutcome {
    pub fn registered(identifier: GlobalId) -> Self {
        Self {
            status: RegistrationStatus::Registered,
            identifier,
            message: None,
        }
    }

    pub fn collision(identifier: GlobalId, message: impl Into<String>) -> Self {
        Self {
            status: RegistrationStatus::Collision,
            identifier,
            message: Some(message.into()),
        }
    }

    pub fn failed(identifier: GlobalId, message: impl Into<String>) -> Self {
        Self {
            status: RegistrationStatus::Failed,
            identifier,
            message: Some(message.into()),
        }
    }

    /// Classifies a text registry response
    ///
    /// A response mentioning the submitted local identifier is a success,
    /// one carrying [`ALREADY_EXISTS_MARKER`] is a collision, anything else
    /// failed. The identifier check runs first.
    pub fn from_response_text(submitted: &GlobalId, text: &str) -> Self {
        if text.contains(&submitted.identifier) {
            Self {
                message: Some(text.to_string()),
                ..Self::registered(submitted.clone())
            }
        } else if text.contains(ALREADY_EXISTS_MARKER) {
            Self::collision(submitted.clone(), text)
        } else {
            Self::failed(submitted.clone(), text)
        }
    }

    pub fn is_registered(&self) -> bool {
        self.status == RegistrationStatus::Registered
    }
}

/// Metadata sent along with a registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationTarget {
    pub global_id: GlobalId,
    /// Landing page the identifier resolves to
    pub url: String,
    pub title: String,
    pub creators: Vec<String>,
    pub publisher: String,
    pub publication_year: i32,
}

/// Static description of a registry connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub name: &'static str,
    pub base_url: String,
}

/// An external persistent identifier registry
#[async_trait]
pub trait IdentifierRegistry: Send + Sync {
    /// Submits one identifier; one call is one registry round trip
    ///
    /// # Errors
    ///
    /// Transport failures surface as [`crate::domain::IdentifierError::RegistryUnavailable`].
    async fn create_identifier(&self, target: &RegistrationTarget) -> Result<RegistrationOutcome>;

    /// Whether the registry already knows the identifier
    async fn already_exists(&self, global_id: &GlobalId) -> Result<bool>;

    fn provider_info(&self) -> ProviderInfo;
}
