//! Request body limits.
//!
//! # Responsibilities
//! - Enforce the maximum request body size
//! - Skip reading entirely when `Content-Length` already exceeds it
//!
//! # Design Decisions
//! - Oversized bodies are treated as empty rather than rejected; the echo
//!   still answers, it just does not echo the body
//! - Bodies are read frame by frame and abandoned as soon as the cap is
//!   crossed, so a slow or huge upload never buffers past the limit

use axum::body::Body;
use axum::http::{header, HeaderMap};

/// Read the whole body as lossy UTF-8, or an empty string if it is larger
/// than `max_body_size` bytes or cannot be read.
pub async fn read_body_capped(headers: &HeaderMap, body: Body, max_body_size: usize) -> String {
    if let Some(declared) = declared_length(headers) {
        if declared > max_body_size as u64 {
            tracing::warn!(
                content_length = declared,
                max_body_size,
                "Request body too large, treating as empty"
            );
            return String::new();
        }
    }

    match axum::body::to_bytes(body, max_body_size).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!(max_body_size, error = %e, "Request body unreadable or over limit, treating as empty");
            String::new()
        }
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
