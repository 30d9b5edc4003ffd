//! Register-file-pids command implementation

use super::{connect, load_checked};
use crate::adapters::registry::create_registry;
use crate::core::identifiers::{FilePidAssigner, IdentifierProvider};
use crate::domain::DatasetId;
use clap::Args;
use std::sync::Arc;

/// Arguments for the register-file-pids command
#[derive(Args, Debug)]
pub struct RegisterFilePidsArgs {
    /// Dataset whose files need identifiers
    #[arg(long)]
    pub dataset: DatasetId,
}

impl RegisterFilePidsArgs {
    /// Execute the register-file-pids command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_checked(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let stores = match connect(&config).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let registry = match create_registry(&config.registry) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Failed to create registry client: {e}");
                return Ok(4);
            }
        };

        let provider = Arc::new(IdentifierProvider::new(
            registry,
            stores.datasets.clone(),
            config.identifiers.clone(),
            config.application.clone(),
        ));
        let assigner = FilePidAssigner::new(provider, stores.datasets);

        let summary = match assigner.obtain_persistent_identifiers_for_datafiles(self.dataset).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(dataset_id = %self.dataset, error = %e, "File identifier assignment failed");
                eprintln!("File identifier assignment failed: {e}");
                return Ok(5);
            }
        };

        println!("🏷️  Dataset {}", self.dataset);
        println!("  Assigned: {}", summary.assigned);
        println!("  Registered: {}", summary.registered);
        println!("  Failed: {}", summary.failed);

        Ok(if summary.failed > 0 { 1 } else { 0 })
    }
}
