//! Custom header directive.
//!
//! Parses the compact `Name:Value, Name2:Value2` mini-language into an
//! ordered list of header pairs. Duplicate names are kept in encounter order
//! so several `Set-Cookie` headers can be produced from one directive.
//!
//! # Parsing rules
//! - If any name repeats (case-insensitive) across the comma-separated
//!   tokens, every token is split on its first `:` independently.
//! - Otherwise, if the whole string starts with `Set-Cookie:`, the rest is
//!   split into cookies on commas followed by `identifier=`, so attributes
//!   such as `Path=/` stay attached to their cookie.
//! - Otherwise the generic per-token split applies.
//!
//! The cookie boundary heuristic is best effort: a value that itself
//! contains `, name=` is split in two. That matches what clients of this
//! server have always observed and is kept as is.
//!
//! Any pair that is not a legal HTTP header discards the whole list; header
//! augmentation never fails a request.

use std::collections::HashSet;
use std::sync::OnceLock;

use axum::http::{HeaderName, HeaderValue};
use regex::Regex;

const SET_COOKIE_PREFIX: &str = "set-cookie:";

/// Ordered header pairs; names may repeat.
pub type HeaderPairs = Vec<(String, String)>;

fn cookie_boundary() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| {
        Regex::new(r",\s*[A-Za-z_][A-Za-z0-9_]*=").expect("cookie boundary pattern is valid")
    })
}

/// Parse a header directive. Returns an empty list for anything unusable.
pub fn parse_header_directive(raw: &str) -> HeaderPairs {
    let pairs = if has_repeated_names(raw) {
        split_tokens(raw)
    } else if starts_with_ignore_case(raw, SET_COOKIE_PREFIX) {
        split_set_cookie(&raw[SET_COOKIE_PREFIX.len()..])
    } else {
        split_tokens(raw)
    };

    if let Some((name, value)) = pairs.iter().find(|(n, v)| !is_valid_pair(n, v)) {
        tracing::debug!(name = %name, value = %value, "Discarding header directive with an invalid header");
        return Vec::new();
    }
    pairs
}

fn has_repeated_names(raw: &str) -> bool {
    let mut seen = HashSet::new();
    raw.split(',')
        .filter_map(|token| token.split_once(':'))
        .map(|(name, _)| name.trim().to_ascii_lowercase())
        .any(|name| !seen.insert(name))
}

fn split_tokens(raw: &str) -> HeaderPairs {
    raw.split(',')
        .filter_map(|token| token.split_once(':'))
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, value)| !name.is_empty() && !value.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn split_set_cookie(cookies: &str) -> HeaderPairs {
    let cookies = cookies.trim();
    let mut segments = Vec::new();
    let mut start = 0;
    for boundary in cookie_boundary().find_iter(cookies) {
        segments.push(&cookies[start..boundary.start()]);
        // resume just past the comma; the cookie name is part of the next segment
        start = boundary.start() + 1;
    }
    segments.push(&cookies[start..]);

    segments
        .into_iter()
        .map(str::trim)
        .filter(|cookie| !cookie.is_empty())
        .map(|cookie| ("Set-Cookie".to_string(), cookie.to_string()))
        .collect()
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn is_valid_pair(name: &str, value: &str) -> bool {
    HeaderName::from_bytes(name.as_bytes()).is_ok() && HeaderValue::from_str(value).is_ok()
}
