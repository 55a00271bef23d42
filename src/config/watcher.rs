//! Configuration file watcher for hot reload.
//!
//! Watches the directory containing the config file rather than the file
//! itself, so editors that save by writing a temp file and renaming it over
//! the original still trigger a reload.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{apply_env_overrides, read_config};
use crate::config::env::ProcessEnv;
use crate::config::schema::EchoConfig;
use crate::config::validation::validate_config;

/// Sends a freshly loaded [`EchoConfig`] whenever the file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    current: EchoConfig,
    update_tx: mpsc::UnboundedSender<EchoConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`. `current` is the configuration already
    /// running, used to suppress no-op reloads.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path, current: EchoConfig) -> (Self, mpsc::UnboundedReceiver<EchoConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching in a background thread.
    ///
    /// The returned watcher must be kept alive for updates to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, current, update_tx } = self;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let file_name = path.file_name().map(|n| n.to_os_string());
        let last = Mutex::new(current);
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch error");
                        return;
                    }
                };
                if !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }
                let touches_config = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                if !touches_config {
                    return;
                }

                let mut config = match read_config(&watched) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                        return;
                    }
                };
                apply_env_overrides(&mut config, &ProcessEnv);
                if let Err(errors) = validate_config(&config) {
                    tracing::error!(?errors, "Reloaded config failed validation, keeping current configuration");
                    return;
                }

                let Ok(mut last) = last.lock() else { return };
                if *last == config {
                    tracing::debug!("Config file touched without changes");
                    return;
                }
                *last = config.clone();
                tracing::info!(path = ?watched, "Configuration reloaded");
                let _ = update_tx.send(config);
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}
