//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX`.

use cairn::config::{load_config, DatabaseTarget, IdentifierStyle, RegistryProvider, SecretString};
use cairn::domain::NotificationType;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Serializes tests that touch the process environment
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    std::env::remove_var("CAIRN_APPLICATION_LOG_LEVEL");
    std::env::remove_var("CAIRN_IDENTIFIERS_SHOULDER");
    std::env::remove_var("CAIRN_IDENTIFIERS_MAX_REGISTRATION_ATTEMPTS");
    std::env::remove_var("CAIRN_REGISTRY_PASSWORD");
    std::env::remove_var("CAIRN_NOTIFICATIONS_ALWAYS_MUTED");
    std::env::remove_var("TEST_REGISTRY_PASSWORD");
    std::env::remove_var("TEST_PG_URL");
}

fn exposed(secret: &SecretString) -> String {
    let value: &str = secret.expose_secret().as_ref();
    value.to_string()
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

const MINIMAL: &str = r#"
database_target = "memory"

[registry]
provider = "datacite"
base_url = "https://api.test.datacite.org"
username = "CAIRN.TEST"
password = "secret"
"#;

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
database_target = "postgresql"
environment = "staging"

[application]
log_level = "debug"
site_url = "https://data.example.org"
publisher = "Example Data Repository"

[identifiers]
protocol = "hdl"
authority = "20.500.12345"
shoulder = "TST"
style = "storedProcGenerated"
max_registration_attempts = 4
register_when_published = true
file_pid_format = "independent"

[registry]
provider = "ezid"
base_url = "https://ezid.example.org"
username = "apitest"
password = "apitest-password"
timeout_seconds = 15

[postgresql]
connection_string = "postgresql://cairn:pw@db.example.org:5432/cairn"
max_connections = 12
ssl_mode = "require"

[index]
enabled = false

[notifications]
always_muted = ["REVOKEROLE"]
never_muted = ["SUBMITTEDDS"]

[mail]
enabled = true
relay_url = "https://relay.example.org/send"
from_address = "repository@example.org"

[export]
directory = "/var/lib/cairn/exports"
formats = ["datacite"]

[logging]
local_enabled = false
local_rotation = "hourly"
"#;

    let file = write_config(toml_content);
    let config = load_config(file.path()).expect("Failed to load config");

    assert_eq!(config.database_target, DatabaseTarget::PostgreSQL);
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.application.publisher, "Example Data Repository");
    assert_eq!(
        config.application.landing_page("hdl:20.500.12345/TST1"),
        "https://data.example.org/dataset.xhtml?persistentId=hdl:20.500.12345/TST1"
    );

    assert_eq!(config.identifiers.identifier_style(), IdentifierStyle::StoredProcGenerated);
    assert_eq!(config.identifiers.max_registration_attempts, 4);
    assert!(!config.identifiers.register_immediately());
    assert!(!config.identifiers.dependent_file_pids());

    assert_eq!(config.registry.provider, RegistryProvider::Ezid);
    assert_eq!(config.registry.timeout_seconds, 15);
    assert_eq!(exposed(&config.registry.password), "apitest-password");

    let pg = config.postgresql.as_ref().unwrap();
    assert_eq!(pg.max_connections, 12);
    assert_eq!(pg.ssl_mode, "require");

    assert!(!config.index.enabled);
    assert_eq!(config.notifications.always_muted_types(), vec![NotificationType::RevokeRole]);
    assert_eq!(config.notifications.never_muted_types(), vec![NotificationType::SubmittedDataset]);
    assert!(config.mail.enabled);
    assert_eq!(config.export.formats, vec!["datacite".to_string()]);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_defaults_applied() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(MINIMAL);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.identifiers.protocol, "doi");
    assert_eq!(config.identifiers.authority, "10.5072");
    assert_eq!(config.identifiers.shoulder, "FK2");
    assert_eq!(config.identifiers.max_registration_attempts, 10);
    assert_eq!(config.identifiers.identifier_style(), IdentifierStyle::RandomString);
    assert!(config.identifiers.register_immediately());
    assert!(config.identifiers.file_pids_enabled);
    assert!(!config.mail.enabled);
    assert_eq!(config.export.formats.len(), 2);
}

#[test]
fn test_env_var_substitution() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_REGISTRY_PASSWORD", "from-env");
    std::env::set_var("TEST_PG_URL", "postgresql://cairn@localhost/cairn");

    let file = write_config(
        r#"
database_target = "postgresql"

[registry]
provider = "datacite"
base_url = "https://api.test.datacite.org"
username = "CAIRN.TEST"
password = "${TEST_REGISTRY_PASSWORD}"

[postgresql]
connection_string = "${TEST_PG_URL}"
"#,
    );
    let config = load_config(file.path()).unwrap();
    assert_eq!(exposed(&config.registry.password), "from-env");
    assert_eq!(
        exposed(&config.postgresql.unwrap().connection_string),
        "postgresql://cairn@localhost/cairn"
    );

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_reported() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(&MINIMAL.replace("\"secret\"", "\"${TEST_REGISTRY_PASSWORD}\""));
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_REGISTRY_PASSWORD"));
}

#[test]
fn test_env_overrides() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("CAIRN_IDENTIFIERS_SHOULDER", "ENV");
    std::env::set_var("CAIRN_IDENTIFIERS_MAX_REGISTRATION_ATTEMPTS", "3");
    std::env::set_var("CAIRN_NOTIFICATIONS_ALWAYS_MUTED", "ASSIGNROLE, REVOKEROLE");

    let file = write_config(MINIMAL);
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.identifiers.shoulder, "ENV");
    assert_eq!(config.identifiers.max_registration_attempts, 3);
    assert_eq!(config.notifications.always_muted.len(), 2);

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("CAIRN_IDENTIFIERS_MAX_REGISTRATION_ATTEMPTS", "many");

    let file = write_config(MINIMAL);
    assert!(load_config(file.path()).is_err());

    cleanup_env_vars();
}

#[test]
fn test_validation_failures() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let cases = [
        MINIMAL.replace("provider = \"datacite\"", "provider = \"crossref\""),
        format!("{MINIMAL}\n[identifiers]\nmax_registration_attempts = 0\n"),
        format!("{MINIMAL}\n[notifications]\nalways_muted = [\"NOSUCHTYPE\"]\n"),
        format!("{MINIMAL}\n[export]\nformats = [\"ddi\"]\n"),
        MINIMAL.replace("database_target = \"memory\"", "database_target = \"postgresql\""),
        MINIMAL.replace(
            "database_target = \"memory\"",
            "database_target = \"memory\"\nenvironment = \"production\"",
        ),
    ];
    for content in cases {
        let file = write_config(&content);
        assert!(load_config(file.path()).is_err(), "accepted invalid config:\n{content}");
    }
}

#[test]
fn test_missing_file() {
    let result = load_config("/nonexistent/cairn.toml");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("not found"));
}
