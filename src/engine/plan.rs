//! The resolved response for one request.

use crate::body::BodyStrategy;

/// Status, body and extra headers, ready for a transport to emit.
///
/// `headers` may repeat a name; transports must append, not insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePlan {
    /// Always within 100..=599.
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
    /// True when no custom headers were requested, so the transport should
    /// add `content-type: application/json` itself.
    pub content_type_default: bool,
    /// Which body strategy produced `body`.
    pub strategy: BodyStrategy,
}
