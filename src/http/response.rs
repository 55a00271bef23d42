//! Response emission.
//!
//! # Responsibilities
//! - Turn a [`ResponsePlan`] into an HTTP response
//! - Append custom headers in order, keeping duplicate names
//! - Add `content-type` when no custom headers were requested, and always
//!   the `server` header
//! - Log and count every finished request
//!
//! # Design Decisions
//! - Any failure here becomes the generic 500 envelope
//! - Informational (1xx) statuses cannot be a final HTTP/1 response, so a
//!   plan carrying one is answered with the 500 envelope. The request record
//!   and metrics see the 500 that is actually sent
//! - `content-length` and `transfer-encoding` from the header directive are
//!   dropped; the HTTP layer owns framing and rejects conflicting values

use std::time::Instant;

use axum::body::Body;
use axum::http::{header, Response as HttpResponse, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::context::RequestContext;
use crate::engine::{EchoEngine, ResponsePlan};
use crate::error::EngineError;
use crate::observability::{metrics, RequestRecord};

/// Build the HTTP response for `plan`.
pub fn build_response(plan: ResponsePlan, server_name: &str) -> Result<Response, EngineError> {
    if (100..200).contains(&plan.status) {
        return Err(EngineError::InformationalStatus(plan.status));
    }

    let mut builder = HttpResponse::builder().status(StatusCode::from_u16(plan.status).unwrap_or(StatusCode::OK));
    for (name, value) in &plan.headers {
        if is_framing_header(name) {
            tracing::debug!(name = %name, value = %value, "Ignoring framing header from header directive");
            continue;
        }
        // Builder::header appends, so repeated names survive
        builder = builder.header(name.as_str(), value.as_str());
    }
    if plan.content_type_default {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    builder = builder.header(header::SERVER, server_name);
    Ok(builder.body(Body::from(plan.body))?)
}

fn is_framing_header(name: &str) -> bool {
    name.eq_ignore_ascii_case(header::CONTENT_LENGTH.as_str())
        || name.eq_ignore_ascii_case(header::TRANSFER_ENCODING.as_str())
}

/// Emit the response for one request and record it.
pub fn finalize(
    engine: &EchoEngine,
    ctx: &RequestContext,
    plan: Result<ResponsePlan, EngineError>,
    started: Instant,
) -> Response {
    let response = plan
        .and_then(|plan| build_response(plan, &engine.config().logging.app_name))
        .unwrap_or_else(IntoResponse::into_response);

    let status = response.status().as_u16();
    if engine.config().features.logs {
        RequestRecord::new(ctx, status).emit(engine.config().logging.format);
    }
    metrics::record_request(&ctx.method, status, started);
    response
}
