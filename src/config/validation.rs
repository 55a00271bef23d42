//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (port, delay window, limits)
//! - Reject empty directive names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EchoConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::IpAddr;
use thiserror::Error;

use crate::config::schema::EchoConfig;

/// Upper bound for `timing.max_delay_ms` (5 minutes).
pub const MAX_DELAY_CEILING_MS: u64 = 300_000;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("port must be between 1 and 65535, got {0}")]
    InvalidPort(u16),

    #[error("invalid host: {0:?}")]
    InvalidHost(String),

    #[error("maximum delay ({max}ms) must be >= minimum delay ({min}ms)")]
    DelayWindowInverted { min: u64, max: u64 },

    #[error("maximum delay cannot exceed 300000ms, got {0}ms")]
    DelayTooLarge(u64),

    #[error("request timeout ({timeout_secs}s) must exceed the maximum delay ({max_delay_ms}ms)")]
    TimeoutShorterThanDelay { timeout_secs: u64, max_delay_ms: u64 },

    #[error("directive name `{0}` must not be empty")]
    EmptyCommand(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}

/// Check a configuration, collecting every problem found.
///
/// Port 0 is accepted so tests and ad hoc runs can ask for an ephemeral port.
pub fn validate_config(config: &EchoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_valid_host(&config.server.host) {
        errors.push(ValidationError::InvalidHost(config.server.host.clone()));
    }

    let timing = &config.timing;
    if timing.max_delay_ms < timing.min_delay_ms {
        errors.push(ValidationError::DelayWindowInverted {
            min: timing.min_delay_ms,
            max: timing.max_delay_ms,
        });
    }
    if timing.max_delay_ms > MAX_DELAY_CEILING_MS {
        errors.push(ValidationError::DelayTooLarge(timing.max_delay_ms));
    }
    if config.limits.request_timeout_secs.saturating_mul(1000) <= timing.max_delay_ms {
        errors.push(ValidationError::TimeoutShorterThanDelay {
            timeout_secs: config.limits.request_timeout_secs,
            max_delay_ms: timing.max_delay_ms,
        });
    }

    let c = &config.commands;
    let names = [
        ("http_body_query", &c.http_body_query),
        ("http_body_header", &c.http_body_header),
        ("http_env_body_query", &c.http_env_body_query),
        ("http_env_body_header", &c.http_env_body_header),
        ("http_code_query", &c.http_code_query),
        ("http_code_header", &c.http_code_header),
        ("http_headers_query", &c.http_headers_query),
        ("http_headers_header", &c.http_headers_header),
        ("time_query", &c.time_query),
        ("time_header", &c.time_header),
        ("file_query", &c.file_query),
        ("file_header", &c.file_header),
    ];
    for (field, value) in names {
        if value.trim().is_empty() {
            errors.push(ValidationError::EmptyCommand(field));
        }
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroLimit("limits.max_body_size"));
    }
    if config.files.max_file_size == 0 {
        errors.push(ValidationError::ZeroLimit("files.max_file_size"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a port given on the command line, where 0 is not meaningful.
pub fn validate_port(port: u16) -> Result<(), ValidationError> {
    if port == 0 {
        Err(ValidationError::InvalidPort(port))
    } else {
        Ok(())
    }
}

/// A host is an IP literal or a hostname made of letters, digits, dots and hyphens.
pub fn is_valid_host(host: &str) -> bool {
    let host = host.trim();
    if host.is_empty() {
        return false;
    }
    if host.parse::<IpAddr>().is_ok() {
        return true;
    }
    host.len() <= 253
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EchoConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EchoConfig::default();
        config.server.host = "bad host!".into();
        config.timing.min_delay_ms = 500;
        config.timing.max_delay_ms = 100;
        config.commands.time_query = " ".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::InvalidHost("bad host!".into())));
        assert!(errors.contains(&ValidationError::DelayWindowInverted { min: 500, max: 100 }));
        assert!(errors.contains(&ValidationError::EmptyCommand("time_query")));
    }

    #[test]
    fn test_delay_ceiling() {
        let mut config = EchoConfig::default();
        config.timing.max_delay_ms = 300_001;
        config.limits.request_timeout_secs = 400;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::DelayTooLarge(300_001)]);
    }

    #[test]
    fn test_timeout_must_cover_delay() {
        let mut config = EchoConfig::default();
        config.limits.request_timeout_secs = 10;
        assert!(matches!(
            validate_config(&config).unwrap_err()[..],
            [ValidationError::TimeoutShorterThanDelay { .. }]
        ));
    }

    #[test]
    fn test_hosts() {
        assert!(is_valid_host("0.0.0.0"));
        assert!(is_valid_host("::1"));
        assert!(is_valid_host("echo-1.internal"));
        assert!(!is_valid_host(""));
        assert!(!is_valid_host("a_b"));
        assert!(validate_port(0).is_err());
        assert!(validate_port(80).is_ok());
    }
}
