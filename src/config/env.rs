//! Environment variable lookup.
//!
//! The configuration loader and the environment body strategy both read the
//! process environment. They go through [`EnvSource`] so tests can supply a
//! fixed map instead of mutating the real environment.

use std::collections::HashMap;

/// Read access to environment variables.
pub trait EnvSource: Send + Sync + std::fmt::Debug {
    /// Value of a single variable, if set and valid UTF-8.
    fn var(&self, name: &str) -> Option<String>;

    /// Every variable, sorted by name.
    fn vars(&self) -> Vec<(String, String)>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        if name.is_empty() || name.contains('=') || name.contains('\0') {
            return None;
        }
        std::env::var(name).ok()
    }

    fn vars(&self) -> Vec<(String, String)> {
        let mut vars: Vec<_> = std::env::vars().collect();
        vars.sort();
        vars
    }
}

/// Fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
    pub fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }

    fn vars(&self) -> Vec<(String, String)> {
        let mut vars: Vec<_> = self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        vars.sort();
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_env_rejects_invalid_names() {
        assert_eq!(ProcessEnv.var(""), None);
        assert_eq!(ProcessEnv.var("A=B"), None);
    }

    #[test]
    fn test_map_env_sorted() {
        let env = MapEnv::new([("B", "2"), ("A", "1")]);
        assert_eq!(env.var("A").as_deref(), Some("1"));
        assert_eq!(env.vars(), vec![("A".into(), "1".into()), ("B".into(), "2".into())]);
    }
}
