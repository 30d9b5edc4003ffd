//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "cairn.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Cairn configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set database_target to 'postgresql' or 'memory'");
                println!("  3. Create a .env file with your credentials:");
                println!("     - Set CAIRN_REGISTRY_PASSWORD");
                println!("     - Set CAIRN_PG_URL (if using PostgreSQL)");
                println!("  4. Validate configuration: cairn validate-config");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    fn generate_minimal_config() -> String {
        r#"# Cairn Configuration File

database_target = "postgresql"  # postgresql | memory

[application]
log_level = "info"
site_url = "https://data.example.org"
publisher = "Example Data Repository"

[identifiers]
protocol = "doi"
authority = "10.5072"
shoulder = "FK2"
style = "randomString"

[registry]
provider = "datacite"
base_url = "https://api.test.datacite.org"
username = "EXAMPLE.REPO"
password = "${CAIRN_REGISTRY_PASSWORD}"

[postgresql]
connection_string = "${CAIRN_PG_URL}"

[index]
solr_url = "http://localhost:8983/solr/collection1"

[logging]
local_enabled = true
local_path = "./logs"
"#
        .to_string()
    }

    fn generate_config_with_examples() -> String {
        r#"# Cairn Configuration File
#
# Values of the form ${VAR} are read from the environment (or .env).
# Any key can be overridden with CAIRN_<SECTION>_<KEY>.

# Persistence backend: postgresql for deployments, memory for local trials
database_target = "postgresql"

# development | staging | production
environment = "development"

[application]
log_level = "info"
# Public URL; identifier landing pages point here
site_url = "https://data.example.org"
# Publisher sent with every registration
publisher = "Example Data Repository"

[identifiers]
# doi | hdl
protocol = "doi"
authority = "10.5072"
# Prefix of every generated local identifier
shoulder = "FK2"
# randomString | storedProcGenerated
style = "randomString"
# Total registry calls per registration, collisions included
max_registration_attempts = 10
max_generation_attempts = 10
# true defers registration to publication
register_when_published = false
file_pids_enabled = true
# dependent (<dataset>/<n>) | independent
file_pid_format = "dependent"

[registry]
# datacite | ezid
provider = "datacite"
base_url = "https://api.test.datacite.org"
username = "EXAMPLE.REPO"
password = "${CAIRN_REGISTRY_PASSWORD}"
timeout_seconds = 60
tls_verify = true

[postgresql]
connection_string = "${CAIRN_PG_URL}"
max_connections = 20
connection_timeout_seconds = 30
statement_timeout_seconds = 60
# disable | allow | prefer | require | verify-ca | verify-full
ssl_mode = "prefer"

[index]
enabled = true
solr_url = "http://localhost:8983/solr/collection1"
timeout_seconds = 60

[notifications]
# Muted for everyone
always_muted = []
# Delivered regardless of user preferences
never_muted = ["SUBMITTEDDS", "PUBLISHFAILED_PIDREG"]

[mail]
enabled = false
relay_url = "https://mail-relay.example.org/send"
api_key = "${CAIRN_MAIL_API_KEY}"
from_address = "repository@example.org"

[export]
directory = "./exports"
# dataverse_json | datacite
formats = ["dataverse_json", "datacite"]

[logging]
local_enabled = true
local_path = "./logs"
# daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}
