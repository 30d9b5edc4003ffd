//! File identifier pre-registration
//!
//! Gives every data file of a dataset that lacks one an identifier, and
//! registers it when registration happens at save time. All changes to one
//! dataset land in a single commit.

use crate::adapters::database::traits::{DatasetStore, UnitOfWork};
use crate::core::identifiers::registration::IdentifierProvider;
use crate::domain::{DataFileId, DatasetId, PersistenceError, Result};
use serde::Serialize;
use std::sync::Arc;

/// Counts for one dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilePidSummary {
    /// Files that had no identifier
    pub assigned: usize,
    /// Of those, registered at the registry
    pub registered: usize,
    pub failed: usize,
}

pub struct FilePidAssigner {
    provider: Arc<IdentifierProvider>,
    store: Arc<dyn DatasetStore + Send + Sync>,
}

impl FilePidAssigner {
    pub fn new(provider: Arc<IdentifierProvider>, store: Arc<dyn DatasetStore + Send + Sync>) -> Self {
        Self { provider, store }
    }

    /// Assigns, and if configured registers, identifiers for the dataset's files
    ///
    /// # Errors
    ///
    /// Unknown dataset, or a store failure at load or commit time.
    pub async fn obtain_persistent_identifiers_for_datafiles(&self, dataset_id: DatasetId) -> Result<FilePidSummary> {
        let config = self.provider.config();
        let mut summary = FilePidSummary::default();
        if !config.file_pids_enabled {
            tracing::debug!(dataset_id = %dataset_id, "File identifiers disabled");
            return Ok(summary);
        }

        let mut dataset = self
            .store
            .find_dataset(&dataset_id)
            .await?
            .ok_or_else(|| PersistenceError::NotFound(format!("dataset {dataset_id}")))?;

        let pending: Vec<DataFileId> = dataset
            .files
            .iter()
            .filter(|f| f.global_id.is_none())
            .map(|f| f.id)
            .collect();
        if pending.is_empty() {
            return Ok(summary);
        }

        for file_id in pending {
            let gid = match self.provider.generator().generate_file_identifier(&dataset).await {
                Ok(gid) => gid,
                Err(e) => {
                    tracing::warn!(dataset_id = %dataset_id, file_id = %file_id, error = %e, "Could not generate file identifier");
                    summary.failed += 1;
                    continue;
                }
            };
            if let Some(file) = dataset.file_mut(&file_id) {
                file.global_id = Some(gid);
            }
            summary.assigned += 1;

            if !config.register_immediately() {
                continue;
            }
            match self.provider.register_file(&mut dataset, file_id).await {
                Ok(report) if report.is_registered() => summary.registered += 1,
                Ok(_) => summary.failed += 1,
                Err(e) => {
                    tracing::warn!(file_id = %file_id, error = %e, "File identifier registration failed");
                    summary.failed += 1;
                }
            }
        }

        self.store.commit(UnitOfWork::merge(dataset)).await?;
        tracing::info!(
            dataset_id = %dataset_id,
            assigned = summary.assigned,
            registered = summary.registered,
            failed = summary.failed,
            "File identifiers processed"
        );
        Ok(summary)
    }
}
