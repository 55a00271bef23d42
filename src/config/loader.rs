//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::env::EnvSource;
use crate::config::schema::{EchoConfig, LogFormat, LogLevel};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without semantic checks, for callers that still
/// layer environment and CLI overrides on top.
pub fn read_config(path: &Path) -> Result<EchoConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EchoConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// Keys keep the names the server has always honoured (`PORT`,
/// `COMMANDS__HTTPCODE__HEADER`, `ENABLE_FILE`, ...). Values that do not
/// parse leave the current setting untouched.
pub fn apply_env_overrides(config: &mut EchoConfig, env: &dyn EnvSource) {
    if let Some(host) = env.var("HOST") {
        config.server.host = host;
    }
    set_parsed(env, "PORT", &mut config.server.port);

    let c = &mut config.commands;
    let commands: [(&str, &mut String); 12] = [
        ("COMMANDS__HTTPBODY__QUERY", &mut c.http_body_query),
        ("COMMANDS__HTTPBODY__HEADER", &mut c.http_body_header),
        ("COMMANDS__HTTPENVBODY__QUERY", &mut c.http_env_body_query),
        ("COMMANDS__HTTPENVBODY__HEADER", &mut c.http_env_body_header),
        ("COMMANDS__HTTPCODE__QUERY", &mut c.http_code_query),
        ("COMMANDS__HTTPCODE__HEADER", &mut c.http_code_header),
        ("COMMANDS__HTTPHEADERS__QUERY", &mut c.http_headers_query),
        ("COMMANDS__HTTPHEADERS__HEADER", &mut c.http_headers_header),
        ("COMMANDS__TIME__QUERY", &mut c.time_query),
        ("COMMANDS__TIME__HEADER", &mut c.time_header),
        ("COMMANDS__FILE__QUERY", &mut c.file_query),
        ("COMMANDS__FILE__HEADER", &mut c.file_header),
    ];
    for (key, slot) in commands {
        if let Some(value) = env.var(key) {
            *slot = value;
        }
    }

    set_parsed(env, "CONTROLS__TIMES__MIN", &mut config.timing.min_delay_ms);
    set_parsed(env, "CONTROLS__TIMES__MAX", &mut config.timing.max_delay_ms);

    let f = &mut config.features;
    let flags: [(&str, &mut bool); 8] = [
        ("ENABLE_LOGS", &mut f.logs),
        ("ENABLE_HOST", &mut f.host),
        ("ENABLE_HTTP", &mut f.http),
        ("ENABLE_REQUEST", &mut f.request),
        ("ENABLE_COOKIES", &mut f.cookies),
        ("ENABLE_FILE", &mut f.file),
        ("ENABLE_HEADER", &mut f.header),
        ("ENABLE_ENV", &mut f.env),
    ];
    for (key, slot) in flags {
        if let Some(value) = env.var(key) {
            *slot = parse_bool(&value);
        }
    }

    if let Some(app) = env.var("LOGS__APP") {
        config.logging.app_name = app;
    }
    if let Some(level) = env.var("LOGS__LEVEL").as_deref().and_then(LogLevel::parse) {
        config.logging.level = level;
    }
    if let Some(format) = env.var("LOGS__FORMAT").as_deref().and_then(LogFormat::parse) {
        config.logging.format = format;
    }

    if let Some(prefixes) = env.var("FILES__ALLOWED_PREFIXES") {
        config.files.allowed_prefixes = prefixes
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
    }
}

fn set_parsed<T: std::str::FromStr>(env: &dyn EnvSource, key: &str, slot: &mut T) {
    if let Some(value) = env.var(key) {
        match value.trim().parse() {
            Ok(parsed) => *slot = parsed,
            Err(_) => tracing::warn!(key, value = %value, "Ignoring unparseable environment override"),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
