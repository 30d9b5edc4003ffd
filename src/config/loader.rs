//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{CairnConfig, DatabaseTarget};
use super::secret::secret_string;
use crate::domain::errors::RepositoryError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`CairnConfig`]
/// 4. Applies environment variable overrides (`CAIRN_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`RepositoryError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, parsing fails, or validation
/// rejects a value.
///
/// # Examples
///
/// ```no_run
/// use cairn::config::loader::load_config;
///
/// let config = load_config("cairn.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<CairnConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RepositoryError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        RepositoryError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses, overrides and validates configuration text
///
/// # Errors
///
/// Same as [`load_config`], minus file access.
pub fn parse_config(contents: &str) -> Result<CairnConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: CairnConfig = toml::from_str(&contents)
        .map_err(|e| RepositoryError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        RepositoryError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| RepositoryError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(RepositoryError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env(name) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            RepositoryError::Configuration(format!("Invalid value '{raw}' for {name}"))
        }),
        None => Ok(None),
    }
}

fn env_list(name: &str) -> Option<Vec<String>> {
    env(name).map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
}

/// Applies environment variable overrides using the `CAIRN_` prefix
///
/// Variables follow the pattern `CAIRN_<SECTION>_<KEY>`, for example
/// `CAIRN_REGISTRY_PASSWORD` or `CAIRN_IDENTIFIERS_SHOULDER`. Lists take
/// comma-separated values.
///
/// # Errors
///
/// Returns an error when a numeric or boolean override does not parse
fn apply_env_overrides(config: &mut CairnConfig) -> Result<()> {
    // Application
    if let Some(val) = env("CAIRN_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env("CAIRN_APPLICATION_SITE_URL") {
        config.application.site_url = val;
    }
    if let Some(val) = env("CAIRN_APPLICATION_PUBLISHER") {
        config.application.publisher = val;
    }

    // Identifiers
    if let Some(val) = env("CAIRN_IDENTIFIERS_PROTOCOL") {
        config.identifiers.protocol = val;
    }
    if let Some(val) = env("CAIRN_IDENTIFIERS_AUTHORITY") {
        config.identifiers.authority = val;
    }
    if let Some(val) = env("CAIRN_IDENTIFIERS_SHOULDER") {
        config.identifiers.shoulder = val;
    }
    if let Some(val) = env("CAIRN_IDENTIFIERS_STYLE") {
        config.identifiers.style = val;
    }
    if let Some(val) = env_parsed("CAIRN_IDENTIFIERS_MAX_REGISTRATION_ATTEMPTS")? {
        config.identifiers.max_registration_attempts = val;
    }
    if let Some(val) = env_parsed("CAIRN_IDENTIFIERS_REGISTER_WHEN_PUBLISHED")? {
        config.identifiers.register_when_published = val;
    }
    if let Some(val) = env("CAIRN_IDENTIFIERS_FILE_PID_FORMAT") {
        config.identifiers.file_pid_format = val;
    }

    // Registry
    if let Some(val) = env("CAIRN_REGISTRY_BASE_URL") {
        config.registry.base_url = val;
    }
    if let Some(val) = env("CAIRN_REGISTRY_USERNAME") {
        config.registry.username = val;
    }
    if let Some(val) = env("CAIRN_REGISTRY_PASSWORD") {
        config.registry.password = secret_string(val);
    }
    if let Some(val) = env_parsed("CAIRN_REGISTRY_TIMEOUT_SECONDS")? {
        config.registry.timeout_seconds = val;
    }

    // PostgreSQL (only if the section exists or is the target)
    if let Some(val) = env("CAIRN_POSTGRESQL_CONNECTION_STRING") {
        match config.postgresql {
            Some(ref mut pg) => pg.connection_string = secret_string(val),
            None if config.database_target == DatabaseTarget::PostgreSQL => {
                config.postgresql = Some(super::schema::PostgreSQLConfig {
                    connection_string: secret_string(val),
                    max_connections: 10,
                    connection_timeout_seconds: 30,
                    statement_timeout_seconds: 60,
                    ssl_mode: "prefer".to_string(),
                });
            }
            None => {}
        }
    }
    if let Some(ref mut pg) = config.postgresql {
        if let Some(val) = env_parsed("CAIRN_POSTGRESQL_MAX_CONNECTIONS")? {
            pg.max_connections = val;
        }
        if let Some(val) = env("CAIRN_POSTGRESQL_SSL_MODE") {
            pg.ssl_mode = val;
        }
    }

    // Index
    if let Some(val) = env_parsed("CAIRN_INDEX_ENABLED")? {
        config.index.enabled = val;
    }
    if let Some(val) = env("CAIRN_INDEX_SOLR_URL") {
        config.index.solr_url = val;
    }

    // Notifications
    if let Some(val) = env_list("CAIRN_NOTIFICATIONS_ALWAYS_MUTED") {
        config.notifications.always_muted = val;
    }
    if let Some(val) = env_list("CAIRN_NOTIFICATIONS_NEVER_MUTED") {
        config.notifications.never_muted = val;
    }

    // Mail
    if let Some(val) = env_parsed("CAIRN_MAIL_ENABLED")? {
        config.mail.enabled = val;
    }
    if let Some(val) = env("CAIRN_MAIL_RELAY_URL") {
        config.mail.relay_url = val;
    }
    if let Some(val) = env("CAIRN_MAIL_API_KEY") {
        config.mail.api_key = Some(secret_string(val));
    }

    // Export
    if let Some(val) = env("CAIRN_EXPORT_DIRECTORY") {
        config.export.directory = val;
    }
    if let Some(val) = env_list("CAIRN_EXPORT_FORMATS") {
        config.export.formats = val;
    }

    // Logging
    if let Some(val) = env_parsed("CAIRN_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Some(val) = env("CAIRN_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env("CAIRN_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
database_target = "memory"

[registry]
provider = "datacite"
base_url = "https://api.test.datacite.org"
username = "CAIRN.TEST"
password = "secret"
"#;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("CAIRN_UNIT_SUBST_VAR", "test_value");
        let input = "password = \"${CAIRN_UNIT_SUBST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"\n");
        std::env::remove_var("CAIRN_UNIT_SUBST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("CAIRN_UNIT_MISSING_VAR");
        let input = "password = \"${CAIRN_UNIT_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("CAIRN_UNIT_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# password = \"${CAIRN_UNIT_NEVER_SET}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-cairn.toml");
        assert!(matches!(result, Err(RepositoryError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.database_target, DatabaseTarget::Memory);
        assert_eq!(config.identifiers.protocol, "doi");
        assert_eq!(config.identifiers.max_registration_attempts, 10);
        assert_eq!(config.registry.username, "CAIRN.TEST");
    }

    #[test]
    fn test_parse_config_rejects_invalid_section() {
        let text = format!("{MINIMAL}\n[identifiers]\nprotocol = \"ark\"\n");
        let err = parse_config(&text).unwrap_err();
        assert!(err.to_string().contains("identifiers.protocol"));
    }
}
