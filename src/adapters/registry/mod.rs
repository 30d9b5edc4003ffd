//! Persistent identifier registries
//!
//! - [`DataCiteRegistry`] - DataCite REST API (JSON:API)
//! - [`EzidRegistry`] - EZID text API (ANVL)

pub mod datacite;
pub mod ezid;
pub mod traits;

pub use datacite::DataCiteRegistry;
pub use ezid::EzidRegistry;
pub use traits::{
    IdentifierRegistry, ProviderInfo, RegistrationOutcome, RegistrationStatus, RegistrationTarget,
};

use crate::config::{RegistryConfig, RegistryProvider};
use crate::domain::Result;
use std::sync::Arc;

/// Creates the registry client named by `provider`
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn create_registry(config: &RegistryConfig) -> Result<Arc<dyn IdentifierRegistry>> {
    tracing::info!(provider = ?config.provider, base_url = %config.base_url, "Creating identifier registry client");
    Ok(match config.provider {
        RegistryProvider::DataCite => Arc::new(DataCiteRegistry::new(config.clone())?),
        RegistryProvider::Ezid => Arc::new(EzidRegistry::new(config.clone())?),
    })
}
