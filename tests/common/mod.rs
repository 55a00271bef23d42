//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use echo_server::config::{EchoConfig, TransportMode};
use echo_server::{HttpServer, SerialServer, Shutdown};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<EchoConfig>,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    /// Trigger shutdown and wait for the accept loop to exit.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

/// Start the binding selected by `config.server.transport`.
pub async fn start_server(mut config: EchoConfig) -> TestServer {
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();

    let handle = match config.server.transport {
        TransportMode::Async => {
            let server = HttpServer::new(config);
            tokio::spawn(server.run(listener, config_updates, server_shutdown))
        }
        TransportMode::Serial | TransportMode::Threaded => {
            let server = SerialServer::new(config);
            tokio::spawn(server.run(listener, config_updates, server_shutdown))
        }
    };

    TestServer {
        addr,
        shutdown,
        config_tx,
        handle,
    }
}

/// Config with the given transport and a small delay ceiling.
pub fn config_with(transport: TransportMode) -> EchoConfig {
    let mut config = EchoConfig::default();
    config.server.transport = transport;
    config.timing.max_delay_ms = 2_000;
    config.features.logs = false;
    config
}

/// Client without pooling, so every request opens its own connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap()
}
