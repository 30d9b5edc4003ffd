//! External system integrations for Cairn.
//!
//! - [`database`] - Store traits, factory and the in-memory store
//! - [`postgresql`] - PostgreSQL store
//! - [`registry`] - DataCite and EZID identifier registries
//! - [`index`] - Solr search index
//! - [`mail`] - Mail relay
//!
//! Each integration sits behind a trait so the core can run against
//! recording fakes in tests.
//!
//! ```rust,no_run
//! use cairn::adapters::registry::create_registry;
//! use cairn::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("cairn.toml")?;
//! let registry = create_registry(&config.registry)?;
//! println!("Registering through {}", registry.provider_info().name);
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod index;
pub mod mail;
pub mod postgresql;
pub mod registry;
