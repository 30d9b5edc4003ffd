// Cairn - Research-data repository service core
// Copyright (c) 2025 Cairn Contributors
// Licensed under the MIT License

//! # Cairn
//!
//! Service core of a research-data repository: versioned datasets with files,
//! dataset locks, persistent identifier generation and registration, user
//! notifications, metadata export and search indexing.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (update workflow, identifiers, locks, notifications, export)
//! - [`adapters`] - External integrations (PostgreSQL, DataCite/EZID, Solr, mail relay)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cairn::config::load_config;
//! use cairn::core::update::{CommandContext, UpdateDatasetCommand};
//! use cairn::domain::{AuthenticatedUser, DatasetId, Principal};
//!
//! # async fn example(id: DatasetId) -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("cairn.toml")?;
//! let (ctx, _stores) = CommandContext::from_config(&config).await?;
//!
//! let dataset = ctx.datasets.find_dataset(&id).await?.ok_or("no such dataset")?;
//! let caller = Principal::Authenticated(AuthenticatedUser::new("@admin", "admin@example.org").superuser());
//!
//! let saved = UpdateDatasetCommand::new(caller, dataset).execute(&ctx).await?;
//! println!("{:?}", saved.global_id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::Result`], whose error is
//! [`domain::RepositoryError`]. Authorization, lock and validation failures
//! are raised before anything is written:
//!
//! ```rust
//! use cairn::domain::RepositoryError;
//!
//! let err = RepositoryError::LockConflict("dataset is locked for Ingest".into());
//! assert!(err.is_precondition_failure());
//! ```
//!
//! ## Logging
//!
//! Cairn logs through `tracing` with structured fields:
//!
//! ```rust,no_run
//! # let id = "7c9e6679-7425-40de-944b-e07fc1f90ae7";
//! tracing::info!(dataset_id = %id, "Dataset updated");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
