//! Injected snapshot of the runner environment

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Immutable key/value view of the environment.
///
/// Captured once per invocation so that everything downstream reads from an
/// explicit value instead of the process globals. Empty values count as unset,
/// matching how the runner passes optional inputs that were not provided.
#[derive(Clone, Default)]
pub struct EnvironmentContext {
    vars: HashMap<String, String>,
}

impl EnvironmentContext {
    /// Snapshot the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build a synthetic context
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `key`, `None` when unset or empty
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Value of `key` or a configuration error naming it
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::Config(format!("{} not set", key)))
    }

    /// Value of `key` or `""`
    #[inline]
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Truthy flag (`1`, `true`, `yes`, case-insensitive)
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }

    /// Return a copy with `key` set
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl std::fmt::Debug for EnvironmentContext {
    // Values are never printed: the environment routinely carries credentials.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("EnvironmentContext")
            .field("keys", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_empty_value_is_unset() {
        let ctx = EnvironmentContext::from_pairs([("A", ""), ("B", "x")]);
        assert_eq!(ctx.get("A"), None);
        assert_eq!(ctx.get("B"), Some("x"));
        assert_eq!(ctx.get_or_empty("A"), "");
    }

    #[test]
    fn test_require_names_missing_key() {
        let ctx = EnvironmentContext::default();
        let err = ctx.require("GITHUB_SHA").unwrap_err();
        assert_matches!(err, Error::Config(ref msg) if msg.contains("GITHUB_SHA"));
    }

    #[test]
    fn test_flag() {
        let ctx = EnvironmentContext::from_pairs([("X", "TRUE"), ("Y", "1"), ("Z", "no")]);
        assert!(ctx.flag("X"));
        assert!(ctx.flag("Y"));
        assert!(!ctx.flag("Z"));
        assert!(!ctx.flag("MISSING"));
    }

    #[test]
    fn test_debug_hides_values() {
        let ctx = EnvironmentContext::from_pairs([("GITHUB_TOKEN", "ghs_abcdef")]);
        let debug = format!("{:?}", ctx);
        assert!(debug.contains("GITHUB_TOKEN"));
        assert!(!debug.contains("ghs_abcdef"));
    }
}
