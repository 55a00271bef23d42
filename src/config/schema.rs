//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the echo server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the echo server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct EchoConfig {
    /// Listener configuration (bind address, transport binding).
    pub server: ServerConfig,

    /// Header and query parameter names for every directive.
    pub commands: CommandConfig,

    /// Artificial delay window.
    pub timing: TimingConfig,

    /// Feature toggles.
    pub features: FeatureFlags,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// File access sandbox.
    pub files: FileConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Metrics settings.
    pub observability: ObservabilityConfig,
}

impl EchoConfig {
    /// Address the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// How requests are scheduled onto workers.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Every request is an independent task; delays yield to the scheduler.
    #[default]
    Async,
    /// One connection at a time; a delay blocks the whole server.
    Serial,
    /// Blocking handlers, one OS thread per connection.
    Threaded,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Host or IP to bind to.
    pub host: String,

    /// TCP port (0 picks an ephemeral port).
    pub port: u16,

    /// Transport binding.
    pub transport: TransportMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            transport: TransportMode::Async,
        }
    }
}

/// Directive names. Header names are matched case-insensitively, query
/// names exactly.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CommandConfig {
    pub http_body_query: String,
    pub http_body_header: String,
    pub http_env_body_query: String,
    pub http_env_body_header: String,
    pub http_code_query: String,
    pub http_code_header: String,
    pub http_headers_query: String,
    pub http_headers_header: String,
    pub time_query: String,
    pub time_header: String,
    pub file_query: String,
    pub file_header: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            http_body_query: "echo_body".to_string(),
            http_body_header: "x-echo-body".to_string(),
            http_env_body_query: "echo_env_body".to_string(),
            http_env_body_header: "x-echo-env-body".to_string(),
            http_code_query: "echo_code".to_string(),
            http_code_header: "x-echo-code".to_string(),
            http_headers_query: "echo_header".to_string(),
            http_headers_header: "x-echo-header".to_string(),
            time_query: "echo_time".to_string(),
            time_header: "x-echo-time".to_string(),
            file_query: "echo_file".to_string(),
            file_header: "x-echo-file".to_string(),
        }
    }
}

/// Bounds applied to the delay directive, in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 0,
            max_delay_ms: 60_000,
        }
    }
}

/// Feature toggles.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FeatureFlags {
    /// Emit one log record per request.
    pub logs: bool,
    /// Include the `host` section in the default echo.
    pub host: bool,
    /// Include the `http` section in the default echo.
    pub http: bool,
    /// Include the `request` section in the default echo.
    pub request: bool,
    /// Parse the `Cookie` header into the `request` section.
    pub cookies: bool,
    /// Allow the file body strategy.
    pub file: bool,
    /// Allow the custom header directive.
    pub header: bool,
    /// Dump the process environment into the default echo.
    pub env: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            logs: true,
            host: true,
            http: true,
            request: true,
            cookies: true,
            file: true,
            header: true,
            env: false,
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parse the legacy lowercase names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warning" | "warn" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

/// Shape of the per-request log record.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `METHOD path - status - client`
    #[default]
    Default,
    /// `timestamp - METHOD path - status`
    Line,
    /// JSON object per record.
    Object,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "line" => Some(Self::Line),
            "object" => Some(Self::Object),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name, also sent in the `server` response header.
    pub app_name: String,
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: "echo-server".to_string(),
            level: LogLevel::Debug,
            format: LogFormat::Default,
        }
    }
}

/// File access sandbox.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Absolute path prefixes the file strategy may read under.
    pub allowed_prefixes: Vec<String>,

    /// Largest file returned verbatim, in bytes.
    pub max_file_size: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            allowed_prefixes: vec!["/tmp".to_string(), "/app".to_string(), "/var/tmp".to_string()],
            max_file_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes. Larger bodies are treated as empty.
    pub max_body_size: usize,

    /// Total time allowed per request on the async binding, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
            request_timeout_secs: 330,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: EchoConfig = toml::from_str(
            r#"
            [server]
            port = 9000
            transport = "serial"

            [timing]
            max_delay_ms = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.transport, TransportMode::Serial);
        assert_eq!(config.timing.max_delay_ms, 1000);
        assert_eq!(config.timing.min_delay_ms, 0);
        assert_eq!(config.commands.http_code_header, "x-echo-code");
        assert!(!config.features.env);
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("warn"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("verbose"), None);
        assert_eq!(LogLevel::Warning.as_directive(), "warn");
    }
}
