//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router; every method and path reaches the echo handler
//! - Wire up middleware (tracing, request timeout, request ID)
//! - Apply delays as non-blocking sleeps so requests stay concurrent
//! - Swap in reloaded configuration without dropping connections
//! - Shut down gracefully on the shutdown broadcast

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::EchoConfig;
use crate::engine::EchoEngine;
use crate::error::EngineError;
use crate::http::request::{connect_info, ingest};
use crate::http::response::finalize;
use crate::lifecycle::shutdown::wait as wait_for_shutdown;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ArcSwap<EchoEngine>>,
}

/// Cooperative HTTP binding for the echo engine.
pub struct HttpServer {
    engine: Arc<ArcSwap<EchoEngine>>,
}

impl HttpServer {
    /// Create a server over the real host identity and environment.
    pub fn new(config: EchoConfig) -> Self {
        Self::with_engine(EchoEngine::new(config))
    }

    pub fn with_engine(engine: EchoEngine) -> Self {
        Self {
            engine: Arc::new(ArcSwap::from_pointee(engine)),
        }
    }

    /// Handle to the live engine; reloads store into it.
    pub fn engine(&self) -> Arc<ArcSwap<EchoEngine>> {
        self.engine.clone()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let timeout = Duration::from_secs(self.engine.load().config().limits.request_timeout_secs);
        Router::new()
            .route("/{*path}", any(echo_handler))
            .route("/", any(echo_handler))
            .with_state(AppState {
                engine: self.engine.clone(),
            })
            .layer(TimeoutLayer::new(timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<EchoConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        bind_port(&self.engine, addr.port());
        tracing::info!(address = %addr, transport = "async", "HTTP server starting");

        tokio::spawn(apply_config_updates(self.engine.clone(), config_updates));

        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Report the port actually bound, which differs from config when it was 0.
pub(crate) fn bind_port(engine: &ArcSwap<EchoEngine>, port: u16) {
    let current = engine.load_full();
    if current.port() != port {
        engine.store(Arc::new(EchoEngine::clone(&current).with_port(port)));
    }
}

/// Rebuild the engine for every accepted configuration.
pub(crate) async fn apply_config_updates(
    engine: Arc<ArcSwap<EchoEngine>>,
    mut updates: mpsc::UnboundedReceiver<EchoConfig>,
) {
    while let Some(config) = updates.recv().await {
        let current = engine.load_full();
        if current.config().bind_address() != config.bind_address() {
            tracing::warn!("Listener address changes need a restart; keeping the current socket");
        }
        engine.store(Arc::new(current.reconfigure(config)));
        tracing::info!("Configuration reloaded");
    }
}

/// Echo handler for every method and path.
async fn echo_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let engine = state.engine.load_full();
    let client = connect_info(&request);
    let ctx = ingest(request, client, engine.config().limits.max_body_size).await;

    let delay = engine.delay(&ctx);
    if !delay.is_zero() {
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Delaying response");
        tokio::time::sleep(delay).await;
    }
    metrics::record_delay(delay);

    // file reads block, so planning leaves the async workers
    let planner = engine.clone();
    let (ctx, plan) = match tokio::task::spawn_blocking(move || {
        let plan = planner.plan(&ctx);
        (ctx, plan)
    })
    .await
    {
        Ok(done) => done,
        Err(e) => {
            let err = EngineError::from(e);
            tracing::error!(error = %err, "Planning task failed");
            return axum::response::IntoResponse::into_response(err);
        }
    };

    finalize(&engine, &ctx, plan, started)
}
