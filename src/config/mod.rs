//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (TOML file, then environment overrides)
//!     → CLI flags (main.rs)
//!     → validation.rs (semantic checks)
//!     → EchoConfig (validated, immutable)
//!     → owned by the EchoEngine, shared via Arc
//!
//! On file change (--watch):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → engine rebuilt and swapped atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - No global instance; every component receives the config it needs

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use loader::{apply_env_overrides, load_config, read_config, ConfigError};
pub use schema::{
    CommandConfig, EchoConfig, FeatureFlags, FileConfig, LimitsConfig, LogFormat, LogLevel,
    LoggingConfig, ObservabilityConfig, ServerConfig, TimingConfig, TransportMode,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
