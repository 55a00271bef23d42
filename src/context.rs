//! Per-request input as seen by the directive engine.
//!
//! Transports normalize whatever they received into a [`RequestContext`]
//! once, at ingestion. Header names are lowercased here so nothing
//! downstream has to care about case again.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Request headers keyed by lowercase name.
///
/// Repeated headers are folded into one value: `cookie` joins with `"; "`,
/// everything else with `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalHeaders(BTreeMap<String, String>);

impl CanonicalHeaders {
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in map {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            let key = name.as_str().to_ascii_lowercase();
            let separator = if key == "cookie" { "; " } else { ", " };
            headers
                .entry(key)
                .and_modify(|existing| {
                    existing.push_str(separator);
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        Self(headers)
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CanonicalHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into().to_ascii_lowercase(), v.into()))
                .collect(),
        )
    }
}

/// Multi-valued query parameters, values in the order they appeared.
///
/// Keys are exact (case-sensitive). Parameters with a blank value are
/// dropped at parse time, so `?echo_body=` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, Vec<String>>);

impl QueryParams {
    /// Parse a raw `application/x-www-form-urlencoded` query string.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        if let Some(raw) = raw {
            for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
                if value.is_empty() {
                    continue;
                }
                params.entry(key.into_owned()).or_default().push(value.into_owned());
            }
        }
        Self(params)
    }

    /// First value for `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Everything the engine may look at for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub method: String,
    /// Path without the query string.
    pub path: String,
    /// Raw query string, if any, exactly as received.
    pub raw_query: Option<String>,
    pub query: QueryParams,
    pub headers: CanonicalHeaders,
    /// Body decoded as UTF-8 (lossy); empty when over the size cap.
    pub body: String,
    pub client: Option<SocketAddr>,
}

impl RequestContext {
    /// Path plus query string, as the client sent it.
    pub fn original_url(&self) -> String {
        match &self.raw_query {
            Some(q) if !q.is_empty() => format!("{}?{}", self.path, q),
            _ => self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_headers_lowercased_and_folded() {
        let mut map = HeaderMap::new();
        map.append("X-Echo-Body", HeaderValue::from_static("a"));
        map.append("accept", HeaderValue::from_static("text/html"));
        map.append("accept", HeaderValue::from_static("application/json"));
        map.append("cookie", HeaderValue::from_static("a=1"));
        map.append("cookie", HeaderValue::from_static("b=2"));

        let headers = CanonicalHeaders::from_header_map(&map);
        assert_eq!(headers.get("x-echo-body"), Some("a"));
        assert_eq!(headers.get("X-ECHO-BODY"), Some("a"));
        assert_eq!(headers.get("accept"), Some("text/html, application/json"));
        assert_eq!(headers.get("cookie"), Some("a=1; b=2"));
    }

    #[test]
    fn test_query_multi_valued_and_blank_dropped() {
        let query = QueryParams::parse(Some("a=1&a=2&b=&c=hello%20world&d"));
        assert_eq!(query.first("a"), Some("1"));
        assert_eq!(query.iter().next().unwrap().1, ["1".to_string(), "2".to_string()]);
        assert!(!query.contains("b"));
        assert!(!query.contains("d"));
        assert_eq!(query.first("c"), Some("hello world"));
        assert!(!query.contains("A"));
    }

    #[test]
    fn test_original_url() {
        let ctx = RequestContext {
            path: "/a/b".into(),
            raw_query: Some("x=1".into()),
            ..Default::default()
        };
        assert_eq!(ctx.original_url(), "/a/b?x=1");
    }
}
