//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once, from the logging config
//! - Emit one record per completed request in the configured shape
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - `object` switches the whole subscriber to JSON lines, so the request
//!   record and every other event stay machine readable
//! - Only a fixed handful of request headers are ever logged

use chrono::Utc;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::context::RequestContext;

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    let level = config.level.as_directive();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("echo_server={level},tower_http={level}")));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = match config.format {
        LogFormat::Default => builder.try_init(),
        LogFormat::Line => builder.compact().with_target(false).try_init(),
        LogFormat::Object => builder.json().try_init(),
    };
}

/// One finished request, as the request log sees it.
#[derive(Debug, Clone, Copy)]
pub struct RequestRecord<'a> {
    pub ctx: &'a RequestContext,
    pub status: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SafeHeaders<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accept: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accept_encoding: Option<&'a str>,
}

impl<'a> RequestRecord<'a> {
    pub fn new(ctx: &'a RequestContext, status: u16) -> Self {
        Self { ctx, status }
    }

    fn client_ip(&self) -> String {
        self.ctx
            .client
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// `"GET /path - 200 - 127.0.0.1"`
    pub fn default_message(&self) -> String {
        format!("{} {} - {} - {}", self.ctx.method, self.ctx.path, self.status, self.client_ip())
    }

    /// `"Mon, 01 Jan 2024 00:00:00 GMT - GET /path - 200"`
    pub fn line_message(&self) -> String {
        format!(
            "{} - {} {} - {}",
            Utc::now().format("%a, %d %b %Y %H:%M:%S GMT"),
            self.ctx.method,
            self.ctx.path,
            self.status
        )
    }

    fn query_json(&self) -> String {
        let query: serde_json::Map<String, serde_json::Value> = self
            .ctx
            .query
            .iter()
            .map(|(name, values)| {
                let value = match values {
                    [single] => serde_json::Value::from(single.as_str()),
                    many => serde_json::Value::from(many.to_vec()),
                };
                (name.to_string(), value)
            })
            .collect();
        serde_json::Value::Object(query).to_string()
    }

    fn headers_json(&self) -> String {
        let headers = &self.ctx.headers;
        serde_json::to_string(&SafeHeaders {
            host: headers.get("host"),
            content_type: headers.get("content-type"),
            accept: headers.get("accept"),
            accept_encoding: headers.get("accept-encoding"),
        })
        .unwrap_or_default()
    }

    /// Emit the record in `format`.
    pub fn emit(&self, format: LogFormat) {
        match format {
            LogFormat::Default => tracing::info!("{}", self.default_message()),
            LogFormat::Line => tracing::info!("{}", self.line_message()),
            LogFormat::Object => tracing::info!(
                method = %self.ctx.method,
                path = %self.ctx.path,
                status = self.status,
                client = %self.client_ip(),
                user_agent = self.ctx.headers.get("user-agent").unwrap_or("unknown"),
                content_length = self.ctx.body.len(),
                query = %self.query_json(),
                headers = %self.headers_json(),
                "request"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use crate::context::{CanonicalHeaders, QueryParams};

    fn ctx() -> RequestContext {
        RequestContext {
            method: "DELETE".into(),
            path: "/items/7".into(),
            raw_query: Some("a=1&b=2&b=3".into()),
            query: QueryParams::parse(Some("a=1&b=2&b=3")),
            headers: [("Host", "h:1"), ("Authorization", "secret"), ("Accept", "*/*")]
                .into_iter()
                .collect::<CanonicalHeaders>(),
            body: "abc".into(),
            client: Some("10.2.3.4:5555".parse().unwrap()),
        }
    }

    #[test]
    fn test_default_message() {
        let ctx = ctx();
        assert_eq!(RequestRecord::new(&ctx, 204).default_message(), "DELETE /items/7 - 204 - 10.2.3.4");

        let anonymous = RequestContext { client: None, ..ctx };
        assert!(RequestRecord::new(&anonymous, 200).default_message().ends_with("- unknown"));
    }

    #[test]
    fn test_line_message() {
        let ctx = ctx();
        let line = RequestRecord::new(&ctx, 500).line_message();
        assert!(line.ends_with(" GMT - DELETE /items/7 - 500"), "{line}");
    }

    #[test]
    fn test_object_fields_filter_headers() {
        let ctx = ctx();
        let record = RequestRecord::new(&ctx, 200);

        let headers: serde_json::Value = serde_json::from_str(&record.headers_json()).unwrap();
        assert_eq!(headers, serde_json::json!({"host": "h:1", "accept": "*/*"}));

        let query: serde_json::Value = serde_json::from_str(&record.query_json()).unwrap();
        assert_eq!(query, serde_json::json!({"a": "1", "b": ["2", "3"]}));
    }

    #[test]
    fn test_init_and_emit_do_not_panic() {
        init_logging(&LoggingConfig {
            app_name: "t".into(),
            level: LogLevel::Error,
            format: LogFormat::Object,
        });
        let ctx = ctx();
        for format in [LogFormat::Default, LogFormat::Line, LogFormat::Object] {
            RequestRecord::new(&ctx, 200).emit(format);
        }
    }
}
