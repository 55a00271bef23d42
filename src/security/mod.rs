//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (cap the request body)
//!     → [directive engine]
//!     → sandbox.rs (file body strategy only: path checks, size cap)
//! ```
//!
//! # Design Decisions
//! - No trust in client input: paths and sizes are checked before any I/O
//! - Violations become JSON error bodies or empty bodies, never crashes

pub mod limits;
pub mod sandbox;

pub use limits::read_body_capped;
pub use sandbox::{AllowedPathSet, FileAccessGuard};
