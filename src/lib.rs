//! HTTP echo server library.
//!
//! The directive engine (`directive`, `body`, `security`, `engine`) turns a
//! [`context::RequestContext`] into an [`engine::ResponsePlan`]; the `http`
//! bindings feed it requests and emit its plans.

// Core subsystems
pub mod body;
pub mod config;
pub mod context;
pub mod directive;
pub mod engine;
pub mod error;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::EchoConfig;
pub use engine::{EchoEngine, ResponsePlan};
pub use error::EngineError;
pub use http::{HttpServer, SerialServer};
pub use lifecycle::Shutdown;
