//! CLI command implementations
//!
//! Commands return process exit codes: 0 success, 1 partial failure,
//! 2 configuration error, 4 connection error, 5 fatal error.

pub mod export;
pub mod init;
pub mod locks;
pub mod pids;
pub mod validate;

use crate::adapters::database::{create_stores, Stores};
use crate::config::{load_config, CairnConfig};

/// Loads and validates the configuration, or yields the exit code to stop with
pub(crate) fn load_checked(config_path: &str) -> Result<CairnConfig, i32> {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, config_path = %config_path, "Failed to load configuration");
            eprintln!("Failed to load configuration: {e}");
            return Err(2);
        }
    };
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Configuration validation failed");
        eprintln!("Configuration validation failed: {e}");
        return Err(2);
    }
    Ok(config)
}

/// Connects to the configured store, or yields the exit code to stop with
pub(crate) async fn connect(config: &CairnConfig) -> Result<Stores, i32> {
    let stores = match create_stores(config).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create store");
            eprintln!("Failed to connect to store: {e}");
            return Err(4);
        }
    };
    if let Err(e) = stores.datasets.test_connection().await {
        tracing::error!(error = %e, "Store connection test failed");
        eprintln!("Failed to connect to store: {e}");
        return Err(4);
    }
    Ok(stores)
}
