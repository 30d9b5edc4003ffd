//! Search index integration
//!
//! The update workflow refreshes the index after every commit. Failures are
//! reported to the caller, which logs them; they never undo a save.

pub mod solr;

pub use solr::SolrIndex;

use crate::config::IndexConfig;
use crate::domain::{Dataset, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// A search index holding dataset and file documents
#[async_trait]
pub trait IndexService: Send + Sync {
    /// Indexes the dataset and its latest version's files
    ///
    /// A minor update only rewrites documents; otherwise stale file
    /// documents of the dataset are removed first.
    async fn index_dataset(&self, dataset: &Dataset, minor_update: bool) -> Result<()>;
}

/// Index used when indexing is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledIndex;

#[async_trait]
impl IndexService for DisabledIndex {
    async fn index_dataset(&self, dataset: &Dataset, _minor_update: bool) -> Result<()> {
        tracing::trace!(dataset_id = %dataset.id, "Indexing disabled, skipping");
        Ok(())
    }
}

/// Creates the configured index client
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn create_index(config: &IndexConfig) -> Result<Arc<dyn IndexService>> {
    if !config.enabled {
        return Ok(Arc::new(DisabledIndex));
    }
    Ok(Arc::new(SolrIndex::new(config.clone())?))
}
