//! Request ingestion.
//!
//! # Responsibilities
//! - Turn an HTTP request into a [`RequestContext`] exactly once
//! - Canonicalize header names and parse the query string
//! - Read the body under the size cap
//!
//! # Design Decisions
//! - Shared by both transports so they see identical inputs
//! - The client address is optional; router-level tests run without a socket

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;

use crate::context::{CanonicalHeaders, QueryParams, RequestContext};
use crate::security::read_body_capped;

/// Peer address recorded by `into_make_service_with_connect_info`, if any.
pub fn connect_info<B>(request: &Request<B>) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Build the per-request context, consuming the request.
pub async fn ingest(
    request: Request<Body>,
    client: Option<SocketAddr>,
    max_body_size: usize,
) -> RequestContext {
    let (parts, body) = request.into_parts();
    let raw_query = parts.uri.query().map(str::to_owned);
    let body = read_body_capped(&parts.headers, body, max_body_size).await;

    RequestContext {
        method: parts.method.as_str().to_owned(),
        path: parts.uri.path().to_owned(),
        query: QueryParams::parse(raw_query.as_deref()),
        raw_query,
        headers: CanonicalHeaders::from_header_map(&parts.headers),
        body,
        client,
    }
}
