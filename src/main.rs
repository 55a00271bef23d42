//! HTTP echo server.
//!
//! Answers every request with a response shaped by directives in its
//! headers or query string: status code, body, extra headers, delay, or a
//! sandboxed file read. Without directives it echoes the request back.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (async | serial | threaded)
//!                        │ request.rs → RequestContext
//!                        ▼
//!                     engine ──▶ directive (extract, delay, status, headers)
//!                        │   ──▶ body (custom → env → file → echo)
//!                        │            └─▶ security::sandbox, net::identity
//!                        ▼
//!     ◀────────────── response.rs (plan → HTTP)
//!
//!     Cross-cutting: config (+watcher), observability, lifecycle
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use echo_server::config::{
    apply_env_overrides, read_config, validate_config, ConfigWatcher, EchoConfig, LogFormat,
    LogLevel, ProcessEnv, TransportMode,
};
use echo_server::config::validation::validate_port;
use echo_server::http::{HttpServer, SerialServer};
use echo_server::lifecycle::{shutdown_on_signal, Shutdown};
use echo_server::observability::{init_logging, init_metrics};

/// HTTP echo server driven by request directives.
#[derive(Debug, Parser)]
#[command(name = "echo-server", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reload the configuration file when it changes.
    #[arg(long, requires = "config")]
    watch: bool,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long, value_enum)]
    transport: Option<TransportMode>,

    /// Lower bound for artificial delays, in milliseconds.
    #[arg(long, value_name = "MS")]
    min_delay: Option<u64>,

    /// Upper bound for artificial delays, in milliseconds.
    #[arg(long, value_name = "MS")]
    max_delay: Option<u64>,

    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Name reported in logs and in the `server` response header.
    #[arg(long)]
    log_app_name: Option<String>,

    /// Allowed file prefix; repeat to allow several. Replaces the configured list.
    #[arg(long = "allow-path", value_name = "PREFIX")]
    allow_paths: Vec<String>,

    #[arg(long)]
    disable_logs: bool,

    #[arg(long)]
    disable_host_info: bool,

    #[arg(long)]
    disable_http_info: bool,

    #[arg(long)]
    disable_request_info: bool,

    #[arg(long)]
    disable_cookies: bool,

    #[arg(long)]
    disable_file_ops: bool,

    #[arg(long)]
    disable_custom_headers: bool,

    /// Include the process environment in echo responses.
    #[arg(long)]
    enable_env_vars: bool,

    /// Validate the configuration, print a summary and exit.
    #[arg(long)]
    config_check: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    show_config: bool,
}

impl Cli {
    /// Overlay command line flags; they win over file and environment.
    fn apply(&self, config: &mut EchoConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(transport) = self.transport {
            config.server.transport = transport;
        }
        if let Some(min) = self.min_delay {
            config.timing.min_delay_ms = min;
        }
        if let Some(max) = self.max_delay {
            config.timing.max_delay_ms = max;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(name) = &self.log_app_name {
            config.logging.app_name = name.clone();
        }
        if !self.allow_paths.is_empty() {
            config.files.allowed_prefixes = self.allow_paths.clone();
        }

        let features = &mut config.features;
        features.logs &= !self.disable_logs;
        features.host &= !self.disable_host_info;
        features.http &= !self.disable_http_info;
        features.request &= !self.disable_request_info;
        features.cookies &= !self.disable_cookies;
        features.file &= !self.disable_file_ops;
        features.header &= !self.disable_custom_headers;
        features.env |= self.enable_env_vars;
    }
}

/// Defaults, then file, then environment, then command line.
fn build_config(cli: &Cli) -> Result<EchoConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => EchoConfig::default(),
    };
    apply_env_overrides(&mut config, &ProcessEnv);
    cli.apply(&mut config);
    Ok(config)
}

fn print_summary(config: &EchoConfig) {
    println!("Configuration is valid");
    println!("  listen:     {} ({:?})", config.bind_address(), config.server.transport);
    println!("  delay:      {}..={} ms", config.timing.min_delay_ms, config.timing.max_delay_ms);
    println!("  files:      {}", config.files.allowed_prefixes.join(", "));
    println!("  logging:    {:?} / {:?}", config.logging.level, config.logging.format);
    println!("  features:   {:?}", config.features);
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.show_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut errors = validate_config(&config).err().unwrap_or_default();
    if let Some(port) = cli.port {
        if let Err(e) = validate_port(port) {
            errors.push(e);
        }
    }
    if !errors.is_empty() {
        eprintln!("Invalid configuration:");
        for error in &errors {
            eprintln!("  - {error}");
        }
        return Ok(ExitCode::FAILURE);
    }

    if cli.config_check {
        print_summary(&config);
        return Ok(ExitCode::SUCCESS);
    }

    init_logging(&config.logging);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "echo-server starting");

    init_metrics(&config.observability)?;

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    // the watcher must outlive the server for reloads to flow
    let (_watcher, config_updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.clone());
            (Some(watcher.run()?), updates)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        transport = ?config.server.transport,
        max_delay_ms = config.timing.max_delay_ms,
        "Listening for connections"
    );
    if config.server.transport == TransportMode::Serial {
        tracing::warn!("Serial transport: a delayed request blocks every other client until it completes");
    }

    match config.server.transport {
        TransportMode::Async => {
            HttpServer::new(config)
                .run(listener, config_updates, shutdown.subscribe())
                .await?
        }
        TransportMode::Serial | TransportMode::Threaded => {
            SerialServer::new(config)
                .run(listener, config_updates, shutdown.subscribe())
                .await?
        }
    }

    tracing::info!("Shutdown complete");
    Ok(ExitCode::SUCCESS)
}
