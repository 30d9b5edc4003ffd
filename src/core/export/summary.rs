//! Export and reindex run summaries

use crate::domain::DatasetId;
use serde::Serialize;
use std::time::Duration;

/// Why a dataset failed during a bulk run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetFailure {
    pub dataset_id: DatasetId,
    pub message: String,
}

/// Result of one export-all or reindex-all run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportSummary {
    /// Local datasets looked at
    pub total_datasets: usize,

    /// Datasets that qualified and were worked on
    pub processed: usize,

    pub succeeded: usize,

    pub failed: usize,

    /// Datasets that did not qualify or were already current
    pub skipped: usize,

    #[serde(skip)]
    pub duration: Duration,

    pub failures: Vec<DatasetFailure>,
}

impl ExportSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, dataset_id: DatasetId, message: impl Into<String>) {
        self.processed += 1;
        self.failed += 1;
        self.failures.push(DatasetFailure {
            dataset_id,
            message: message.into(),
        });
    }

    pub fn is_successful(&self) -> bool {
        self.failed == 0
    }

    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 100.0;
        }
        (self.succeeded as f64 / self.processed as f64) * 100.0
    }

    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation,
            total = self.total_datasets,
            processed = self.processed,
            succeeded = self.succeeded,
            failed = self.failed,
            skipped = self.skipped,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Bulk run completed"
        );
        for failure in &self.failures {
            tracing::warn!(dataset_id = %failure.dataset_id, message = %failure.message, "Dataset failed");
        }
    }
}
