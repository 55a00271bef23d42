//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request (both transports):
//!     → logging.rs (one record per request, if features.logs)
//!     → metrics.rs (counter + latency/delay histograms)
//!
//! Everything else:
//!     → tracing events, filtered by RUST_LOG or logging.level
//! ```
//!
//! # Design Decisions
//! - `tracing` everywhere; the subscriber decides the output shape
//! - Metrics are cheap to record and only exported when enabled

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, RequestRecord};
pub use metrics::init_metrics;
