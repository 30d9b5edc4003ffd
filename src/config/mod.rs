//! Configuration management for Cairn.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Cairn reads `cairn.toml` with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `CAIRN_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Per-section validation
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and public site URL
//! - [`IdentifierConfig`] - Protocol, authority, shoulder, generation style, attempt ceiling
//! - [`RegistryConfig`] - DataCite or EZID connection
//! - [`PostgreSQLConfig`] - Store connection (when `database_target = "postgresql"`)
//! - [`IndexConfig`] - Solr connection
//! - [`NotificationConfig`] - Installation-wide mute lists
//! - [`MailConfig`] - Mail relay
//! - [`ExportConfig`] - Export directory and formats
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! database_target = "postgresql"
//!
//! [application]
//! log_level = "info"
//! site_url = "https://data.example.org"
//!
//! [identifiers]
//! protocol = "doi"
//! authority = "10.5072"
//! shoulder = "FK2"
//! style = "randomString"
//! max_registration_attempts = 10
//!
//! [registry]
//! provider = "datacite"
//! base_url = "https://api.test.datacite.org"
//! username = "CAIRN.TEST"
//! password = "${CAIRN_REGISTRY_PASSWORD}"
//!
//! [postgresql]
//! connection_string = "${CAIRN_PG_URL}"
//!
//! [notifications]
//! always_muted = ["REVOKEROLE"]
//! never_muted = ["SUBMITTEDDS"]
//! ```
//!
//! # Validation
//!
//! ```rust,no_run
//! use cairn::config::load_config;
//!
//! # fn example() {
//! match load_config("cairn.toml") {
//!     Ok(config) => println!("Store backend: {:?}", config.database_target),
//!     Err(e) => eprintln!("Configuration error: {}", e),
//! }
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, CairnConfig, DatabaseTarget, Environment, ExportConfig, IdentifierConfig,
    IdentifierStyle, IndexConfig, LoggingConfig, MailConfig, NotificationConfig,
    PostgreSQLConfig, RegistryConfig, RegistryProvider,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
