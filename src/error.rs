//! Engine failures.
//!
//! Malformed directives and file guard problems are not errors here; they
//! degrade inside the engine. Anything that does surface as an
//! [`EngineError`] becomes a 500 with a fixed JSON envelope.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body sent with every 500.
pub const INTERNAL_ERROR_BODY: &str = r#"{"error":{"code":500,"message":"Internal Server Error"}}"#;

/// Errors that escape the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The default echo payload could not be serialized.
    #[error("failed to serialize echo payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The blocking task computing the plan panicked or was cancelled.
    #[error("engine task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A 1xx status was planned; HTTP/1 cannot send it as a final response.
    #[error("informational status {0} cannot end a request")]
    InformationalStatus(u16),

    /// The plan could not be turned into an HTTP response.
    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

/// The generic 500 response.
pub fn internal_error_response() -> Response {
    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed inside the engine");
        internal_error_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_envelope() {
        let err = EngineError::from(serde_json::from_str::<u8>("x").unwrap_err());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], 500);
        assert_eq!(json["error"]["message"], "Internal Server Error");
    }
}
