//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{ExporterConfig, SecurityMode};
use super::secret::secret_string;
use crate::domain::{ExportError, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "CSV_EXPORT_";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ExporterConfig
/// 4. Applies environment variable overrides (CSV_EXPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`ExportError::Configuration`] if the file cannot be read or
/// parsed, a referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use csv_export::config::load_config;
///
/// let config = load_config("exports.toml").expect("Failed to load config");
/// println!("{} exports configured", config.exports.len());
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ExporterConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Same as [`load_config`] for configuration already in memory
pub fn parse_config(contents: &str) -> Result<ExporterConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: ExporterConfig = toml::from_str(&contents)
        .map_err(|e| ExportError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ExportError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Constant pattern, cannot fail to compile
    RE.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap())
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. Every unset variable is reported at
/// once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = placeholder_regex();
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|m| m == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        lines.push(processed.into_owned());
    }

    if !missing_vars.is_empty() {
        return Err(ExportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn env(name: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{name}")).ok()
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        ExportError::Configuration(format!("Invalid value '{raw}' for {ENV_PREFIX}{name}"))
    })
}

/// Applies environment variable overrides using CSV_EXPORT_* prefix
///
/// Variables follow the pattern CSV_EXPORT_<SECTION>_<KEY>, for example
/// CSV_EXPORT_EXPORT_DEFAULT_MAX_ROWS or CSV_EXPORT_SECURITY_MODE.
fn apply_env_overrides(config: &mut ExporterConfig) -> Result<()> {
    if let Some(val) = env("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Some(val) = env("EXPORT_DEFAULT_MAX_ROWS") {
        config.export.default_max_rows = parse_env("EXPORT_DEFAULT_MAX_ROWS", &val)?;
    }

    if let Some(val) = env("SECURITY_MODE") {
        config.security.mode = match val.trim().to_ascii_lowercase().as_str() {
            "permit_all" => SecurityMode::PermitAll,
            "roles" => SecurityMode::Roles,
            _ => {
                return Err(ExportError::Configuration(format!(
                    "Invalid value '{val}' for {ENV_PREFIX}SECURITY_MODE. Must be one of: permit_all, roles"
                )))
            }
        };
    }
    if let Some(val) = env("SECURITY_WILDCARD_ROLE") {
        config.security.wildcard_role = val;
    }

    if let Some(val) = env("AUDIT_FILE_ENABLED") {
        config.audit.file_enabled = parse_env("AUDIT_FILE_ENABLED", &val)?;
    }
    if let Some(val) = env("AUDIT_FILE_PATH") {
        config.audit.file_path = val;
    }
    if let Some(val) = env("AUDIT_JSON_FORMAT") {
        config.audit.json_format = parse_env("AUDIT_JSON_FORMAT", &val)?;
    }

    if let Some(ref mut pg) = config.postgresql {
        if let Some(val) = env("POSTGRESQL_CONNECTION_STRING") {
            pg.connection_string = secret_string(val);
        }
        if let Some(val) = env("POSTGRESQL_MAX_CONNECTIONS") {
            pg.max_connections = parse_env("POSTGRESQL_MAX_CONNECTIONS", &val)?;
        }
        if let Some(val) = env("POSTGRESQL_STATEMENT_TIMEOUT_SECONDS") {
            pg.statement_timeout_seconds = parse_env("POSTGRESQL_STATEMENT_TIMEOUT_SECONDS", &val)?;
        }
    }

    if let Some(val) = env("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env("LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
