//! Configuration Module
//!
//! Loads decorator defaults and the log filter from environment variables.

use std::env;

use crate::key::DEFAULT_NAMESPACE;
use crate::ttl::Ttl;

/// Default log filter when neither `RUST_LOG` nor `MEMO_CACHE_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "memo_cache=warn";

/// Process-wide defaults for memoized calls.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Default time-to-live for memoized results
    pub ttl: Ttl,
    /// Default namespace
    pub namespace: String,
    /// Whether keys distinguish argument types by default
    pub typed: bool,
    /// Filter directive passed to the log subscriber
    pub log_filter: String,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMO_CACHE_TTL` - Seconds, or `inf`/`infinite` (default: infinite)
    /// - `MEMO_CACHE_NAMESPACE` - Default namespace (default: `default`)
    /// - `MEMO_CACHE_TYPED` - `true`/`false`/`1`/`0` (default: false)
    /// - `MEMO_CACHE_LOG` - Log filter (default: `memo_cache=warn`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl: env::var("MEMO_CACHE_TTL")
                .ok()
                .and_then(|v| Ttl::parse(&v))
                .unwrap_or(defaults.ttl),
            namespace: env::var("MEMO_CACHE_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty() && !v.contains(':'))
                .unwrap_or(defaults.namespace),
            typed: env::var("MEMO_CACHE_TYPED")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.typed),
            log_filter: env::var("MEMO_CACHE_LOG")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_filter),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Ttl::Infinite,
            namespace: DEFAULT_NAMESPACE.to_string(),
            typed: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 4] = [
        "MEMO_CACHE_TTL",
        "MEMO_CACHE_NAMESPACE",
        "MEMO_CACHE_TYPED",
        "MEMO_CACHE_LOG",
    ];

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Ttl::Infinite);
        assert_eq!(config.namespace, "default");
        assert!(!config.typed);
        assert_eq!(config.log_filter, "memo_cache=warn");
    }

    // One test owns the environment so parallel tests cannot interleave.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }
        assert_eq!(CacheConfig::from_env(), CacheConfig::default());

        env::set_var("MEMO_CACHE_TTL", "2.5");
        env::set_var("MEMO_CACHE_NAMESPACE", "users");
        env::set_var("MEMO_CACHE_TYPED", "1");
        env::set_var("MEMO_CACHE_LOG", "memo_cache=debug");
        let config = CacheConfig::from_env();
        assert_eq!(config.ttl, Ttl::Seconds(2.5));
        assert_eq!(config.namespace, "users");
        assert!(config.typed);
        assert_eq!(config.log_filter, "memo_cache=debug");

        env::set_var("MEMO_CACHE_TTL", "forever-ish");
        env::set_var("MEMO_CACHE_NAMESPACE", "a:b");
        env::set_var("MEMO_CACHE_TYPED", "maybe");
        let config = CacheConfig::from_env();
        assert_eq!(config.ttl, Ttl::Infinite);
        assert_eq!(config.namespace, "default");
        assert!(!config.typed);

        env::set_var("MEMO_CACHE_TTL", "inf");
        assert_eq!(CacheConfig::from_env().ttl, Ttl::Infinite);

        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("yes"), None);
    }
}
