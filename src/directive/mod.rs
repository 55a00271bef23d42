//! Directive resolution subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext (canonical headers + query)
//!     → extractor.rs (header-over-query lookup)
//!     → timing.rs   (delay, clamped; transport suspends)
//!     → status.rs   (single code or random pick from A-B-C)
//!     → [body strategy chain]
//!     → headers.rs  (extra response headers)
//! ```
//!
//! # Design Decisions
//! - Malformed directives never fail a request; each degrades to a default
//! - Header directives beat query directives, even when empty
//! - Parsers are pure functions over strings so they test in isolation

pub mod extractor;
pub mod headers;
pub mod status;
pub mod timing;

pub use extractor::{Directive, DirectiveExtractor};
pub use headers::{parse_header_directive, HeaderPairs};
pub use status::resolve_status;
pub use timing::TimingGate;
