//! Shutdown coordination for the echo server.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Transports and the config watcher subscribe; one `trigger` stops them all.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Safe to call with none listening.
    pub fn trigger(&self) {
        if self.tx.send(()).is_ok() {
            tracing::info!(subscribers = self.tx.receiver_count(), "Shutdown triggered");
        }
    }

    /// Number of tasks still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once `rx` fires or its sender is gone.
pub async fn wait(mut rx: broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}
