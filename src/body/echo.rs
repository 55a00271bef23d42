//! Default echo payload.
//!
//! The payload mirrors the request back as pretty JSON. Each top-level
//! section except `server` can be switched off through feature flags.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::config::{EnvSource, FeatureFlags};
use crate::context::RequestContext;
use crate::net::{HostSnapshot, NetworkIdentity};

/// Identity of this server instance, reported in every echo.
#[derive(Debug, Clone, Serialize)]
pub struct ServerSection<'a> {
    pub name: &'a str,
    pub port: u16,
    #[serde(rename = "instanceId")]
    pub instance_id: Uuid,
}

#[derive(Debug, Serialize)]
struct HttpSection<'a> {
    method: &'a str,
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "originalUrl")]
    original_url: String,
    protocol: &'static str,
}

/// A query parameter with one value serializes as a string, otherwise as an array.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum QueryValue<'a> {
    One(&'a str),
    Many(&'a [String]),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestSection<'a> {
    params: BTreeMap<String, String>,
    query: BTreeMap<&'a str, QueryValue<'a>>,
    body: &'a str,
    headers: &'a BTreeMap<String, String>,
    remote_address: Option<String>,
    remote_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cookies: Option<BTreeMap<&'a str, &'a str>>,
}

#[derive(Debug, Serialize)]
struct EchoPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<&'a HostSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    http: Option<HttpSection<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request: Option<RequestSection<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<BTreeMap<String, String>>,
    server: ServerSection<'a>,
}

/// Render the echo for `ctx` as pretty-printed JSON.
pub fn render(
    ctx: &RequestContext,
    features: &FeatureFlags,
    identity: &dyn NetworkIdentity,
    env: &dyn EnvSource,
    server: ServerSection<'_>,
) -> Result<String, serde_json::Error> {
    let host = features.host.then(|| identity.snapshot());

    let http = features.http.then(|| HttpSection {
        method: &ctx.method,
        base_url: format!("http://{}", ctx.headers.get("host").unwrap_or("localhost")),
        original_url: ctx.original_url(),
        protocol: "http",
    });

    let request = features.request.then(|| RequestSection {
        params: BTreeMap::new(),
        query: ctx
            .query
            .iter()
            .map(|(name, values)| {
                let value = match values {
                    [single] => QueryValue::One(single.as_str()),
                    many => QueryValue::Many(many),
                };
                (name, value)
            })
            .collect(),
        body: &ctx.body,
        headers: ctx.headers.as_map(),
        remote_address: ctx.client.map(|addr| addr.ip().to_string()),
        remote_port: ctx.client.map(|addr| addr.port()),
        cookies: features
            .cookies
            .then(|| parse_cookies(ctx.headers.get("cookie").unwrap_or_default())),
    });

    let environment = features.env.then(|| env.vars().into_iter().collect());

    let payload = EchoPayload {
        host: host.as_deref(),
        http,
        request,
        environment,
        server,
    };
    serde_json::to_string_pretty(&payload)
}

/// Split a `Cookie` header on `;` into `name=value` pairs. Later duplicates win.
pub fn parse_cookies(header: &str) -> BTreeMap<&str, &str> {
    header
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .collect()
}
