//! Bulk export and reindex
//!
//! Export-all walks every local dataset. A dataset qualifies when it is
//! released, not deaccessioned and, unless forced, was never exported or was
//! exported before its latest release. Successful exports stamp the dataset's
//! last export time.

use crate::adapters::database::traits::DatasetStore;
use crate::adapters::index::IndexService;
use crate::core::export::exporter::MetadataExporter;
use crate::core::export::summary::ExportSummary;
use crate::domain::{Dataset, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Whether a dataset should be (re)exported
pub fn needs_export(dataset: &Dataset, force: bool) -> bool {
    if dataset.harvested || !dataset.is_released() || dataset.is_deaccessioned() {
        return false;
    }
    if force {
        return true;
    }
    match (dataset.last_export_time, dataset.release_time()) {
        (None, _) => true,
        (Some(exported), Some(released)) => exported < released,
        (Some(_), None) => false,
    }
}

#[derive(Clone)]
pub struct ExportService {
    store: Arc<dyn DatasetStore + Send + Sync>,
    exporter: Arc<dyn MetadataExporter>,
    index: Arc<dyn IndexService>,
}

impl ExportService {
    pub fn new(
        store: Arc<dyn DatasetStore + Send + Sync>,
        exporter: Arc<dyn MetadataExporter>,
        index: Arc<dyn IndexService>,
    ) -> Self {
        Self { store, exporter, index }
    }

    /// Exports every qualifying local dataset
    ///
    /// Per-dataset failures are counted, not returned.
    ///
    /// # Errors
    ///
    /// Only when the dataset listing itself fails.
    pub async fn export_all_datasets(&self, force: bool) -> Result<ExportSummary> {
        let started = Instant::now();
        let mut summary = ExportSummary::new();
        let ids = self.store.find_all_local_dataset_ids().await?;
        summary.total_datasets = ids.len();
        tracing::info!(datasets = ids.len(), force, "Starting export of all datasets");

        for id in ids {
            let dataset = match self.store.find_dataset(&id).await {
                Ok(Some(ds)) => ds,
                Ok(None) => {
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    summary.record_failure(id, e.to_string());
                    continue;
                }
            };
            if !needs_export(&dataset, force) {
                summary.skipped += 1;
                continue;
            }

            let exported = async {
                self.exporter.export_all_formats(&dataset).await?;
                self.store.set_last_export_time(&dataset.id, Utc::now()).await
            };
            match exported.await {
                Ok(()) => summary.record_success(),
                Err(e) => summary.record_failure(id, e.to_string()),
            }
        }

        let summary = summary.with_duration(started.elapsed());
        summary.log_summary("export");
        Ok(summary)
    }

    /// Runs [`Self::export_all_datasets`] on a spawned task; failures are logged
    pub fn spawn_export_all(&self, force: bool) -> JoinHandle<Option<ExportSummary>> {
        let service = self.clone();
        tokio::spawn(async move {
            match service.export_all_datasets(force).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    crate::log_error_with_context!(e, "Export of all datasets failed");
                    None
                }
            }
        })
    }

    /// Reindexes every local dataset with a full (non-minor) update
    ///
    /// # Errors
    ///
    /// Only when the dataset listing itself fails.
    pub async fn index_all_datasets(&self) -> Result<ExportSummary> {
        let started = Instant::now();
        let mut summary = ExportSummary::new();
        let ids = self.store.find_all_local_dataset_ids().await?;
        summary.total_datasets = ids.len();

        for id in ids {
            let indexed = async {
                match self.store.find_dataset(&id).await? {
                    Some(ds) => self.index.index_dataset(&ds, false).await.map(|_| true),
                    None => Ok(false),
                }
            };
            match indexed.await {
                Ok(true) => summary.record_success(),
                Ok(false) => summary.skipped += 1,
                Err(e) => summary.record_failure(id, e.to_string()),
            }
        }

        let summary = summary.with_duration(started.elapsed());
        summary.log_summary("reindex");
        Ok(summary)
    }

    /// Runs [`Self::index_all_datasets`] on a spawned task; failures are logged
    pub fn spawn_index_all(&self) -> JoinHandle<Option<ExportSummary>> {
        let service = self.clone();
        tokio::spawn(async move {
            match service.index_all_datasets().await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    crate::log_error_with_context!(e, "Reindex of all datasets failed");
                    None
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn released_at(offset_hours: i64) -> Dataset {
        let mut ds = Dataset::builder().owner("root").build().unwrap();
        ds.release_draft(Utc::now() + Duration::hours(offset_hours), false);
        ds
    }

    #[test]
    fn test_never_exported_released_dataset_qualifies() {
        assert!(needs_export(&released_at(0), false));
    }

    #[test]
    fn test_draft_never_qualifies() {
        let ds = Dataset::builder().owner("root").build().unwrap();
        assert!(!needs_export(&ds, true));
    }

    #[test]
    fn test_harvested_never_qualifies() {
        let mut ds = released_at(0);
        ds.harvested = true;
        assert!(!needs_export(&ds, true));
    }

    #[test]
    fn test_export_after_release_is_current() {
        let mut ds = released_at(-2);
        ds.last_export_time = Some(Utc::now() - Duration::hours(1));
        assert!(!needs_export(&ds, false));
        assert!(needs_export(&ds, true));
    }

    #[test]
    fn test_export_before_release_is_stale() {
        let mut ds = released_at(-1);
        ds.last_export_time = Some(Utc::now() - Duration::hours(2));
        assert!(needs_export(&ds, false));
    }

    #[test]
    fn test_deaccessioned_never_qualifies() {
        let mut ds = released_at(-1);
        ds.versions[0].state = crate::domain::VersionState::Deaccessioned;
        assert!(!needs_export(&ds, true));
    }
}
