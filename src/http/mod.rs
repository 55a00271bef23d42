//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (async, Axum) or serial.rs (serial/threaded, hyper)
//!     → request.rs (RequestContext: canonical headers, query, capped body)
//!     → [engine: delay, then plan]
//!     → response.rs (status, custom headers, content-type, server header)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod serial;
pub mod server;

pub use serial::SerialServer;
pub use server::HttpServer;
