//! Export command implementation
//!
//! This module implements the `export` command, which caches metadata
//! exports of released datasets and optionally reindexes them.

use super::{connect, load_checked};
use crate::adapters::index::create_index;
use crate::core::export::{ExportService, ExportSummary, FileSystemExporter};
use clap::Args;
use std::sync::Arc;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Re-export datasets whose cached export is already current
    #[arg(long)]
    pub force: bool,

    /// Also reindex every local dataset afterwards
    #[arg(long)]
    pub reindex: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(force = self.force, reindex = self.reindex, "Starting export command");

        let config = match load_checked(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let stores = match connect(&config).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let index = match create_index(&config.index) {
            Ok(i) => i,
            Err(e) => {
                eprintln!("Failed to create search index client: {e}");
                return Ok(4);
            }
        };

        let service = ExportService::new(
            stores.datasets,
            Arc::new(FileSystemExporter::new(&config.export)),
            index,
        );

        println!("🚀 Exporting datasets to {}", config.export.directory);
        let summary = match service.export_all_datasets(self.force).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(5);
            }
        };
        Self::print_summary("Export", &summary);
        let mut exit_code = Self::exit_code(&summary);

        if self.reindex {
            println!("🔎 Reindexing datasets");
            match service.index_all_datasets().await {
                Ok(s) => {
                    Self::print_summary("Reindex", &s);
                    exit_code = exit_code.max(Self::exit_code(&s));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Reindex failed");
                    eprintln!("Reindex failed: {e}");
                    return Ok(5);
                }
            }
        }

        Ok(exit_code)
    }

    fn print_summary(operation: &str, summary: &ExportSummary) {
        println!();
        println!("📊 {operation} Summary:");
        println!("  Total Datasets: {}", summary.total_datasets);
        println!("  Processed: {}", summary.processed);
        println!("  Succeeded: {}", summary.succeeded);
        println!("  Failed: {}", summary.failed);
        println!("  Skipped: {}", summary.skipped);
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!("  Success Rate: {:.2}%", summary.success_rate());
        for failure in summary.failures.iter().take(10) {
            println!("    - {}: {}", failure.dataset_id, failure.message);
        }
        if summary.failures.len() > 10 {
            println!("    ... and {} more failures", summary.failures.len() - 10);
        }
        println!();
    }

    fn exit_code(summary: &ExportSummary) -> i32 {
        if summary.is_successful() {
            0
        } else {
            1
        }
    }
}
