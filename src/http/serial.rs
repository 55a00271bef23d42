//! Blocking HTTP binding.
//!
//! # Responsibilities
//! - Serve the echo engine one connection at a time (`serial`), or one OS
//!   thread per connection (`threaded`)
//! - Apply delays with `std::thread::sleep`
//!
//! # Design Decisions
//! - In `serial` mode the accept loop drives each connection to completion
//!   before accepting the next. A delayed request therefore holds up every
//!   other client for the whole delay. This is the defining property of the
//!   mode and is kept as is; use `async` or `threaded` for concurrency
//! - Connections are not kept alive, so one slow client cannot pin the
//!   serial worker across requests
//! - Header reads time out so an idle socket cannot stall the loop forever

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::response::Response;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};

use crate::config::{EchoConfig, TransportMode};
use crate::engine::EchoEngine;
use crate::http::request::ingest;
use crate::http::response::finalize;
use crate::http::server::{apply_config_updates, bind_port};
use crate::observability::metrics;

const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP binding for the echo engine.
pub struct SerialServer {
    engine: Arc<ArcSwap<EchoEngine>>,
    threaded: bool,
}

impl SerialServer {
    pub fn new(config: EchoConfig) -> Self {
        let threaded = config.server.transport == TransportMode::Threaded;
        Self::with_engine(EchoEngine::new(config), threaded)
    }

    pub fn with_engine(engine: EchoEngine, threaded: bool) -> Self {
        Self {
            engine: Arc::new(ArcSwap::from_pointee(engine)),
            threaded,
        }
    }

    pub fn engine(&self) -> Arc<ArcSwap<EchoEngine>> {
        self.engine.clone()
    }

    /// Accept and serve connections until `shutdown` fires.
    ///
    /// Shutdown is only observed between connections.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<EchoConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        bind_port(&self.engine, addr.port());
        let transport = if self.threaded { "threaded" } else { "serial" };
        tracing::info!(address = %addr, transport, "HTTP server starting");

        tokio::spawn(apply_config_updates(self.engine.clone(), config_updates));

        loop {
            let (stream, client) = tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        continue;
                    }
                },
            };

            let engine = self.engine.clone();
            if self.threaded {
                let handle = Handle::current();
                let spawned = std::thread::Builder::new()
                    .name(format!("echo-conn-{}", client.port()))
                    .spawn(move || handle.block_on(serve_connection(stream, client, engine)));
                if let Err(e) = spawned {
                    tracing::error!(error = %e, client = %client, "Failed to spawn connection thread");
                }
            } else {
                serve_connection(stream, client, engine).await;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn serve_connection(stream: TcpStream, client: SocketAddr, engine: Arc<ArcSwap<EchoEngine>>) {
    let service = service_fn(move |request: Request<Incoming>| {
        let engine = engine.load_full();
        async move { Ok::<_, Infallible>(handle_blocking(&engine, request, client).await) }
    });

    let served = http1::Builder::new()
        .timer(TokioTimer::new())
        .header_read_timeout(HEADER_READ_TIMEOUT)
        .keep_alive(false)
        .serve_connection(TokioIo::new(stream), service)
        .await;
    if let Err(e) = served {
        tracing::debug!(error = %e, client = %client, "Connection ended with error");
    }
}

async fn handle_blocking(engine: &EchoEngine, request: Request<Incoming>, client: SocketAddr) -> Response {
    let started = Instant::now();
    let request = request.map(Body::new);
    let ctx = ingest(request, Some(client), engine.config().limits.max_body_size).await;

    let delay = engine.delay(&ctx);
    if !delay.is_zero() {
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Delaying response, worker blocked");
        std::thread::sleep(delay);
    }
    metrics::record_delay(delay);

    let plan = engine.plan(&ctx);
    finalize(engine, &ctx, plan, started)
}
