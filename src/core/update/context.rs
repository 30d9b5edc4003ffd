//! Collaborators of the update workflow
//!
//! Everything a command touches is reached through a [`CommandContext`];
//! there is no global state.

use crate::adapters::database::{create_stores, DatasetStore, Stores};
use crate::adapters::index::{create_index, DisabledIndex, IndexService};
use crate::adapters::registry::{create_registry, IdentifierRegistry};
use crate::config::{ApplicationConfig, CairnConfig, IdentifierConfig};
use crate::core::fingerprint::{IngestService, UnfCalculator};
use crate::core::identifiers::IdentifierProvider;
use crate::core::locks::LockManager;
use crate::domain::{MetadataSchema, Result};
use std::sync::Arc;

pub struct CommandContext {
    pub datasets: Arc<dyn DatasetStore + Send + Sync>,
    pub locks: Arc<LockManager>,
    pub identifiers: Arc<IdentifierProvider>,
    pub index: Arc<dyn IndexService>,
    pub ingest: Arc<dyn IngestService>,
    pub schema: MetadataSchema,
}

impl CommandContext {
    pub fn builder() -> CommandContextBuilder {
        CommandContextBuilder::default()
    }

    /// Wires every collaborator from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a store or HTTP client cannot be created.
    pub async fn from_config(config: &CairnConfig) -> Result<(Self, Stores)> {
        let stores = create_stores(config).await?;
        let context = Self::builder()
            .stores(stores.clone())
            .registry(create_registry(&config.registry)?)
            .index(create_index(&config.index)?)
            .identifier_config(config.identifiers.clone())
            .application_config(config.application.clone())
            .build()
            .map_err(crate::domain::RepositoryError::Configuration)?;
        Ok((context, stores))
    }
}

/// Builder for [`CommandContext`]
///
/// Stores and registry are required. The index defaults to disabled, the
/// ingest service to the local UNF calculator and the schema to the citation
/// block.
#[derive(Default)]
pub struct CommandContextBuilder {
    stores: Option<Stores>,
    registry: Option<Arc<dyn IdentifierRegistry>>,
    index: Option<Arc<dyn IndexService>>,
    ingest: Option<Arc<dyn IngestService>>,
    schema: Option<MetadataSchema>,
    identifiers: IdentifierConfig,
    application: ApplicationConfig,
}

impl CommandContextBuilder {
    pub fn stores(mut self, stores: Stores) -> Self {
        self.stores = Some(stores);
        self
    }

    pub fn registry(mut self, registry: Arc<dyn IdentifierRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn index(mut self, index: Arc<dyn IndexService>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn ingest(mut self, ingest: Arc<dyn IngestService>) -> Self {
        self.ingest = Some(ingest);
        self
    }

    pub fn schema(mut self, schema: MetadataSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn identifier_config(mut self, config: IdentifierConfig) -> Self {
        self.identifiers = config;
        self
    }

    pub fn application_config(mut self, config: ApplicationConfig) -> Self {
        self.application = config;
        self
    }

    /// # Errors
    ///
    /// Returns an error if stores or registry are missing
    pub fn build(self) -> std::result::Result<CommandContext, String> {
        let stores = self.stores.ok_or("stores are required")?;
        let registry = self.registry.ok_or("registry is required")?;

        let identifiers = Arc::new(IdentifierProvider::new(
            registry,
            stores.datasets.clone(),
            self.identifiers,
            self.application,
        ));

        Ok(CommandContext {
            datasets: stores.datasets,
            locks: Arc::new(LockManager::new(stores.locks)),
            identifiers,
            index: self.index.unwrap_or_else(|| Arc::new(DisabledIndex)),
            ingest: self.ingest.unwrap_or_else(|| Arc::new(UnfCalculator)),
            schema: self.schema.unwrap_or_default(),
        })
    }
}
