//! `validate-config`: loads the file and prints what a service would run with

use crate::config::schema::DatabaseTarget;
use crate::config::{load_config, CairnConfig};
use clap::Args;
use secrecy::ExposeSecret;

#[derive(Args, Debug)]
pub struct ValidateArgs {}

/// Host part of a connection string, credentials dropped
fn connection_host(connection_string: &str) -> &str {
    connection_string.rsplit('@').next().unwrap_or("***")
}

/// Label/value pairs describing a loaded configuration
fn summary(config: &CairnConfig) -> Vec<(&'static str, String)> {
    let ids = &config.identifiers;
    let mut lines = vec![
        ("Environment", format!("{:?}", config.environment)),
        ("Log level", config.application.log_level.clone()),
        ("Site URL", config.application.site_url.clone()),
    ];

    match (&config.database_target, &config.postgresql) {
        (DatabaseTarget::PostgreSQL, Some(pg)) => {
            let host = connection_host(pg.connection_string.expose_secret().as_ref()).to_string();
            lines.push(("Store", format!("PostgreSQL at {host} (pool {})", pg.max_connections)));
        }
        (DatabaseTarget::PostgreSQL, None) => lines.push(("Store", "PostgreSQL".into())),
        (DatabaseTarget::Memory, _) => lines.push(("Store", "in-memory".into())),
    }

    lines.push((
        "Identifiers",
        format!("{}:{}/{}* ({})", ids.protocol, ids.authority, ids.shoulder, ids.style),
    ));
    lines.push((
        "Registration",
        format!(
            "{}, at most {} registry calls",
            if ids.register_immediately() { "on save" } else { "on publish" },
            ids.max_registration_attempts
        ),
    ));
    lines.push((
        "Registry",
        format!("{:?} at {}", config.registry.provider, config.registry.base_url),
    ));
    lines.push((
        "Search index",
        if config.index.enabled {
            config.index.solr_url.clone()
        } else {
            "disabled".into()
        },
    ));
    lines.push(("Mail", if config.mail.enabled { config.mail.relay_url.clone() } else { "disabled".into() }));
    lines.push(("Export", format!("{} -> {}", config.export.formats.join(", "), config.export.directory)));
    lines
}

impl ValidateArgs {
    /// Exit code 0 when the file loads and validates, 2 otherwise
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");
        println!("🔍 Validating configuration file: {config_path}");

        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        for (label, value) in summary(&config) {
            println!("  {label:<13} {value}");
        }
        println!();
        Ok(0)
    }
}
