//! Status code directive.
//!
//! Accepts a single code (`404`) or a hyphen-separated list (`200-404-500`)
//! from which one valid member is picked uniformly at random. Anything
//! malformed degrades to 200; no error ever reaches the client.

use rand::seq::SliceRandom;
use rand::Rng;

pub const DEFAULT_STATUS: u16 = 200;

/// Resolve a status directive with the thread-local RNG.
pub fn resolve_status(raw: Option<&str>) -> u16 {
    resolve_status_with(raw, &mut rand::thread_rng())
}

/// Resolve a status directive with a caller-supplied RNG.
pub fn resolve_status_with<R: Rng + ?Sized>(raw: Option<&str>, rng: &mut R) -> u16 {
    let raw = raw.unwrap_or("200");

    if raw.contains('-') {
        let candidates: Vec<u16> = raw.split('-').filter_map(parse_code).collect();
        if let Some(code) = candidates.choose(rng) {
            return *code;
        }
    }

    // An all-invalid list lands here too; the whole string still contains
    // `-`, fails to parse and falls through to the default.
    parse_code(raw).unwrap_or(DEFAULT_STATUS)
}

fn parse_code(segment: &str) -> Option<u16> {
    segment
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|code| (100..=599).contains(code))
        .map(|code| code as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_valid_single_code_round_trips() {
        for code in 100..=599u16 {
            assert_eq!(resolve_status(Some(&code.to_string())), code);
        }
    }

    #[test]
    fn test_absent_defaults_to_200() {
        assert_eq!(resolve_status(None), 200);
        assert_eq!(resolve_status(Some("")), 200);
    }

    #[test]
    fn test_out_of_range_and_garbage() {
        assert_eq!(resolve_status(Some("99")), 200);
        assert_eq!(resolve_status(Some("600")), 200);
        assert_eq!(resolve_status(Some("abc")), 200);
        assert_eq!(resolve_status(Some(" 404 ")), 404);
    }

    #[test]
    fn test_all_invalid_list_falls_back_to_200() {
        assert_eq!(resolve_status(Some("abc-999-42")), 200);
        assert_eq!(resolve_status(Some("-")), 200);
        assert_eq!(resolve_status(Some("700-800")), 200);
    }

    #[test]
    fn test_list_skips_invalid_members() {
        for _ in 0..50 {
            assert_eq!(resolve_status(Some("abc-503-999")), 503);
        }
        // leading hyphen splits into an empty segment and the code
        assert_eq!(resolve_status(Some("-404")), 404);
    }

    #[test]
    fn test_list_draws_every_member() {
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let code = resolve_status(Some("200-404-500"));
            assert!([200, 404, 500].contains(&code), "unexpected {code}");
            seen.insert(code);
        }
        assert_eq!(seen.len(), 3);
    }
}
